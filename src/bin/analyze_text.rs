use rumor_ai_lib::init_logging;
use rumor_ai_lib::services::classifier::StylometryClassifier;
use rumor_ai_lib::services::config_store::ConfigStore;
use rumor_ai_lib::services::detection::analyze;
use rumor_ai_lib::services::providers::{get_api_key, AppBuilderClient};
use rumor_ai_lib::services::stats::DetectionStats;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin analyze_text -- <text> [--file <path>] [--app-id <id>] [--stats] [--out <json_path>]\n\nNotes:\n  - 需要配置 APPBUILDER_TOKEN（环境变量或配置文件）以及智能体 app_id。\n  - `--file` 从文件读取待检测文本（优先于位置参数）。\n  - `--stats` 在结果后打印本次进程的统计信息。"
        );
        return Ok(());
    }

    init_logging();

    let raw_text = match parse_arg_value(&args, "--file") {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("read file failed: {}", e))?,
        None => args[1].clone(),
    };

    let config = ConfigStore::default_config_dir()
        .map(ConfigStore::new)
        .map(|store| store.load())
        .transpose()?
        .unwrap_or_default();

    let text = raw_text.trim();
    if text.is_empty() {
        return Err("No text provided".to_string());
    }
    let max_len = config.detection.max_text_length;
    if text.chars().count() > max_len {
        return Err(format!("Text length exceeds limit of {} characters", max_len));
    }

    let app_id = parse_arg_value(&args, "--app-id")
        .or_else(|| std::env::var("APPBUILDER_APP_ID").ok().filter(|v| !v.trim().is_empty()))
        .or_else(|| config.agent.app_id.clone())
        .ok_or_else(|| "Agent app id not configured (use --app-id or APPBUILDER_APP_ID)".to_string())?;
    let token = get_api_key()
        .ok_or_else(|| "Agent token not configured (set APPBUILDER_TOKEN)".to_string())?;

    let agent = match config.agent.base_url.as_deref() {
        Some(url) => AppBuilderClient::with_base_url(&app_id, &token, url),
        None => AppBuilderClient::new(&app_id, &token),
    };

    let classifier = StylometryClassifier;
    let stats = DetectionStats::new();

    let verdict = analyze(&classifier, &agent, &stats, text).await;

    let json = serde_json::to_string_pretty(&verdict).map_err(|e| e.to_string())?;
    println!("{}", json);

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        std::fs::write(&out_path, &json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    if has_flag(&args, "--stats") {
        let snapshot = stats.read_stats();
        let stats_json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!();
        println!("{}", stats_json);
    }

    Ok(())
}
