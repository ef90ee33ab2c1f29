// ==========================================
// 毕业设计师生互选系统 - 管理员命令行入口
// ==========================================
// 用法:
//   mutual-selection auto-assign <event_id>
//   mutual-selection list <event_id>
//   mutual-selection assign <event_id> <team_id> <teacher_id|none>
//   mutual-selection clear <event_id>
//   mutual-selection publish <event_id>
//   mutual-selection unpublish <event_id>
//   mutual-selection options <event_id> [team_id]
//   mutual-selection status <event_id>
//   mutual-selection logs <event_id> [limit]
//   mutual-selection dashboard <event_id> <teacher_id>
//   mutual-selection history <teacher_id>
//
// 数据库路径: MUTUAL_SELECTION_DB_PATH（默认用户数据目录）
// 操作人: MUTUAL_SELECTION_OPERATOR（默认 admin）
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use mutual_selection::app::{get_default_db_path, AppState};
use serde::Serialize;

const USAGE: &str = "用法: mutual-selection <auto-assign|list|assign|clear|publish|unpublish|options|status|logs|dashboard|history> <id> [参数]";

fn main() -> Result<()> {
    mutual_selection::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().ok_or_else(|| anyhow!(USAGE))?;

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, version = mutual_selection::VERSION, "启动");
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let operator = std::env::var("MUTUAL_SELECTION_OPERATOR")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "admin".to_string());

    match command.as_str() {
        "auto-assign" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.assignment_api.run_auto_assign(event_id, &operator)?)
        }
        "list" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.assignment_api.list_assignments(event_id)?)
        }
        "assign" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            let team_id = parse_id(&args, 2, "team_id")?;
            let raw = args.get(3).ok_or_else(|| anyhow!("缺少参数 teacher_id|none"))?;
            let teacher_id = if raw.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    raw.parse::<i64>()
                        .with_context(|| format!("teacher_id 不是整数: {}", raw))?,
                )
            };
            print_json(
                &state
                    .assignment_api
                    .manual_assign(event_id, team_id, teacher_id, &operator)?,
            )
        }
        "clear" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.assignment_api.clear_assignments(event_id, &operator)?)
        }
        "publish" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.assignment_api.publish(event_id, &operator)?)
        }
        "unpublish" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.assignment_api.reset_publication(event_id, &operator)?)
        }
        "options" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            if args.len() > 2 {
                let team_id = parse_id(&args, 2, "team_id")?;
                print_json(&state.assignment_api.get_match_options(event_id, team_id)?)
            } else {
                print_json(&state.assignment_api.get_all_match_options(event_id)?)
            }
        }
        "status" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            print_json(&state.event_api.event_status(event_id)?)
        }
        "logs" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            let limit = match args.get(2) {
                Some(raw) => raw
                    .parse::<usize>()
                    .with_context(|| format!("limit 不是整数: {}", raw))?,
                None => 50,
            };
            print_json(&state.assignment_api.list_action_logs(event_id, limit)?)
        }
        "dashboard" => {
            let event_id = parse_id(&args, 1, "event_id")?;
            let teacher_id = parse_id(&args, 2, "teacher_id")?;
            print_json(&state.preference_api.teacher_dashboard(event_id, teacher_id)?)
        }
        "history" => {
            let teacher_id = parse_id(&args, 1, "teacher_id")?;
            print_json(&state.preference_api.teacher_history(teacher_id)?)
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}

fn parse_id(args: &[String], idx: usize, name: &str) -> Result<i64> {
    let raw = args
        .get(idx)
        .ok_or_else(|| anyhow!("缺少参数 {}\n{}", name, USAGE))?;
    raw.parse::<i64>()
        .with_context(|| format!("{} 不是整数: {}", name, raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
