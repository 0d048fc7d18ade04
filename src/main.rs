use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use plickers_scan::services::Filter;
use plickers_scan::utils::logging;
use plickers_scan::{App, Config, ViewState};

#[derive(Parser)]
#[command(name = "plickers-scan")]
#[command(about = "课堂答题卡扫描：导入名单、拍照识别、统计导出", long_about = None)]
struct Cli {
    /// 会话文件
    #[arg(long, global = true, env = "SESSION_FILE")]
    session: Option<String>,
    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从表格导入班级名单（.xlsx / .xls / .ods / .csv）
    Import { file: PathBuf },
    /// 扫描一张或多张学生举卡的照片（JPEG）
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// 显示统计和学生列表
    Results {
        /// A / B / C / D / none / all
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: Filter,
    },
    /// 导出结果表格
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 切换视图（import / scan / results）
    View { view: ViewState },
    /// 清空名单和结果
    Reset {
        /// 跳过确认
        #[arg(long)]
        yes: bool,
    },
    /// 显示状态栏
    Status,
}

fn parse_filter(s: &str) -> Result<Filter, String> {
    Filter::parse(s).ok_or_else(|| format!("未知筛选条件: {}（可用: A, B, C, D, none, all）", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env();
    if let Some(session) = cli.session {
        config.session_file = session;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config);
    let mut failed_frames = 0;

    let state = match cli.command {
        Commands::Import { file } => app.import(&file).await?,
        Commands::Scan { images } => {
            let summary = app.scan(&images).await?;
            failed_frames = summary.failed;
            summary.state
        }
        Commands::Results { filter } => app.results(filter).await?,
        Commands::Export { out } => {
            app.export(out.as_deref()).await?;
            app.status().await?
        }
        Commands::View { view } => app.navigate(view).await?,
        Commands::Reset { yes } => {
            if !yes && !confirm("确定要删除全部名单和结果吗？[y/N] ").await? {
                println!("已取消。");
                return Ok(());
            }
            app.reset().await?
        }
        Commands::Status => app.status().await?,
    };

    // 状态栏总是显示，扫描失败也不例外
    println!("\n{}", logging::status_line(&state));

    if failed_frames > 0 {
        anyhow::bail!("{} 张照片扫描失败，请重新拍摄", failed_frames);
    }
    Ok(())
}

async fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
