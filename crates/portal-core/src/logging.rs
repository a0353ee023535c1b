//! tracing 기반 로깅 초기화.
//!
//! 서버는 표준 출력에, CLI는 명령 결과와 섞이지 않도록 표준 에러에 기록합니다.
//! `RUST_LOG`가 설정되어 있으면 설정 파일의 레벨보다 우선합니다.

use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::LoggingConfig;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 사람이 읽기 쉬운 여러 줄 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON
    Json,
    /// 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로그 출력 대상.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 필터 지시어 (예: "info", "portal_client=debug")
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// 파일명과 줄 번호 포함 여부
    pub with_location: bool,
}

impl LogConfig {
    /// API 서버용 설정. 표준 출력, 소스 위치 포함.
    pub fn server(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: config.format.parse().unwrap_or_default(),
            output: LogOutput::Stdout,
            with_location: true,
        }
    }

    /// CLI용 설정. 표준 에러에 기록하며 `-v` 횟수로 레벨을 올립니다.
    pub fn cli(config: &LoggingConfig, verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        Self {
            level: level.to_string(),
            format: config.format.parse().unwrap_or(LogFormat::Compact),
            output: LogOutput::Stderr,
            with_location: false,
        }
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_file(self.with_location)
            .with_line_number(self.with_location)
            .with_target(self.with_location);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

/// 주어진 설정으로 전역 subscriber를 설치합니다.
///
/// # 예제
///
/// ```no_run
/// use portal_core::{init_logging, LogConfig, LoggingConfig};
///
/// init_logging(LogConfig::server(&LoggingConfig::default())).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(env_filter)
        .try_init()?;

    tracing::debug!(
        format = ?config.format,
        output = ?config.output,
        level = %config.level,
        "Logging initialized"
    );

    Ok(())
}

/// 인증된 주체와 라우트 필드가 포함된 span.
#[macro_export]
macro_rules! auth_span {
    ($name:expr, $principal:expr, $route:expr) => {
        tracing::info_span!(
            $name,
            principal = %$principal.id,
            role = %$principal.role,
            route = %$route
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(level: &str, format: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: format.to_string(),
        }
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("invalid".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_server_config() {
        let config = LogConfig::server(&settings("portal_api=debug", "json"));

        assert_eq!(config.level, "portal_api=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(config.with_location);
    }

    #[test]
    fn test_cli_config_writes_to_stderr() {
        let quiet = LogConfig::cli(&settings("info", "pretty"), 0);
        assert_eq!(quiet.level, "warn");
        assert_eq!(quiet.output, LogOutput::Stderr);
        assert_eq!(quiet.format, LogFormat::Pretty);

        assert_eq!(LogConfig::cli(&settings("info", "pretty"), 1).level, "info");
        assert_eq!(LogConfig::cli(&settings("info", "pretty"), 3).level, "debug");
    }

    #[test]
    fn test_unknown_format_falls_back() {
        assert_eq!(
            LogConfig::server(&settings("info", "xml")).format,
            LogFormat::Pretty
        );
        assert_eq!(
            LogConfig::cli(&settings("info", "xml"), 0).format,
            LogFormat::Compact
        );
    }
}
