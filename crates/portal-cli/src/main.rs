//! 캠퍼스 포털 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 외부 로그인으로 받은 토큰 저장
//! portal login --token eyJhbGciOi...
//!
//! # 저장된 세션 확인
//! portal status --format json
//!
//! # 보호 API 호출
//! portal get /api/admin/dashboard
//!
//! # 화면 경로의 가드 결정 확인
//! portal guard /instructor/courses
//!
//! # 로그아웃
//! portal logout
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_cli::commands::{output::OutputFormat, request, session, CliContext};
use portal_core::{init_logging, AppConfig, LogConfig};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Campus portal CLI - 세션 및 접근 제어 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, global = true, default_value = "config/portal.toml")]
    config: String,

    /// 로그 상세도 (-v: info, -vv: debug). 로그는 표준 에러로 출력됩니다.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 저장된 세션 상태 확인
    Status {
        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 외부에서 발급된 토큰으로 로그인
    Login {
        /// 토큰 문자열
        #[arg(short, long)]
        token: String,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 로그아웃 및 저장된 토큰 삭제
    Logout,

    /// 인증된 GET 요청
    Get {
        /// API 경로 (예: /api/learner/dashboard)
        path: String,
    },

    /// 화면 경로의 라우트 가드 결정 확인
    Guard {
        /// 화면 경로 (예: /admin/users)
        path: String,
    },

    /// 토큰 페이로드 미리보기 (서명 미검증)
    Preview {
        /// 토큰 (기본: 저장된 토큰)
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config).context("Failed to load configuration")?;

    init_logging(LogConfig::cli(&config.logging, cli.verbose))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let ctx = CliContext::from_config(config.client)?;

    let output = match cli.command {
        Commands::Status { format } => {
            session::status(&ctx, OutputFormat::parse(&format)?).await?
        }
        Commands::Login { token, format } => {
            session::login(&ctx, &token, OutputFormat::parse(&format)?).await?
        }
        Commands::Logout => session::logout(&ctx).await?,
        Commands::Get { path } => request::get(&ctx, &path).await?,
        Commands::Guard { path } => request::guard(&ctx, &path).await,
        Commands::Preview { token } => session::preview(&ctx, token.as_deref()).await?,
    };

    println!("{}", output);
    Ok(())
}
