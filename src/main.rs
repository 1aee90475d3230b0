// ==========================================
// 商品导入暂存系统 - 命令行入口
// ==========================================
// 用法: product-import-staging <db_path> <file> [--user <id>]
// 流程: 初始化日志 → 建表 → 摄取文件 → 自动映射 → 批量暂存 → 输出 JSON
// ==========================================

use product_import_staging::app::AppState;
use product_import_staging::{i18n, logging};
use std::process::ExitCode;

const USAGE: &str = "用法: product-import-staging <db_path> <file> [--user <id>]";

/// 命令行参数
struct CliArgs {
    db_path: String,
    file: String,
    user: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut positional = Vec::new();
    let mut user = "cli".to_string();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => {
                user = args
                    .next()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| "--user 缺少参数".to_string())?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg),
        }
    }

    match positional.as_slice() {
        [db_path, file] => Ok(CliArgs {
            db_path: db_path.clone(),
            file: file.clone(),
            user,
        }),
        _ => Err(USAGE.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    tracing::info!("==================================================");
    tracing::info!("{} v{}", product_import_staging::APP_NAME, product_import_staging::VERSION);
    tracing::info!("==================================================");

    let state = match AppState::new(args.db_path.clone()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "初始化失败");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = i18n::apply_configured_locale(state.config_manager.as_ref()).await {
        tracing::warn!(error = %e, "语言配置读取失败，使用默认语言");
    }

    match state.import_api.import_file(&args.file, &args.user).await {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                println!("{}", json);
                tracing::info!("{}", response.summary);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "结果序列化失败");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(file = %args.file, error = %e, "导入失败");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
