//! cfo-desk: headless scenario runner.
//!
//! Usage:
//!   cfo-desk --context acme.json --months 12 --hires 2 --pricing 5
//!   cfo-desk --ipc-mode --data-dir ./data --db history.db
//!
//! In IPC mode every stdin line is one JSON request and every stdout
//! line is one JSON response.

mod service;

use anyhow::Result;
use runway_core::{
    context::FinancialContext, error::CoreError, EngineConfig, ErrorKind, ScenarioChanges,
    ScenarioEngine, ScenarioLedger, ScenarioReport, ScenarioRequest,
};
use service::DeskService;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Upload {
        context: FinancialContext,
    },
    GetContext {
        company_id: String,
    },
    RunScenario {
        request: ScenarioRequest,
    },
    RunChanges {
        company_id:         String,
        changes:            ScenarioChanges,
        months_to_forecast: Option<i32>,
    },
    Preview {
        company_id:         String,
        changes:            ScenarioChanges,
        months_to_forecast: Option<i32>,
    },
    History {
        company_id: String,
        #[serde(default = "default_history_page")]
        limit:      usize,
    },
    Usage,
    Health,
    Quit,
}

fn default_history_page() -> usize {
    10
}

#[derive(serde::Serialize)]
struct IpcError {
    kind:    ErrorKind,
    message: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");

    let config = EngineConfig::load_or_default(data_dir)?;
    let ledger = if db == ":memory:" {
        ScenarioLedger::in_memory()?
    } else {
        ScenarioLedger::open(db)?
    };
    ledger.migrate()?;

    let service = DeskService::new(ScenarioEngine::build(config), ledger);

    if ipc_mode {
        run_ipc_loop(&service)
    } else {
        run_once(&service, &args)
    }
}

fn run_ipc_loop(service: &DeskService) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err = IpcError {
                    kind:    ErrorKind::InvalidInput,
                    message: e.to_string(),
                };
                writeln!(stdout, "{}", serde_json::json!({ "error": err }))?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let line = match handle_command(service, cmd) {
            Ok(value) => serde_json::json!({ "ok": value }),
            Err(e) => {
                log::warn!("Request failed ({:?}): {e}", e.kind());
                let err = IpcError {
                    kind:    e.kind(),
                    message: e.user_message(),
                };
                serde_json::json!({ "error": err })
            }
        };
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    service: &DeskService,
    cmd: IpcCommand,
) -> Result<serde_json::Value, CoreError> {
    let default_months = service.engine().config().default_forecast_months;
    let value = match cmd {
        IpcCommand::Upload { context } => serde_json::to_value(service.upload(context)?)?,
        IpcCommand::GetContext { company_id } => {
            serde_json::to_value(service.context(&company_id)?)?
        }
        IpcCommand::RunScenario { request } => {
            serde_json::to_value(service.run_request(&request)?)?
        }
        IpcCommand::RunChanges { company_id, changes, months_to_forecast } => {
            let months = months_to_forecast.unwrap_or(default_months);
            serde_json::to_value(service.run_changes(&company_id, &changes, months)?)?
        }
        IpcCommand::Preview { company_id, changes, months_to_forecast } => {
            let months = months_to_forecast.unwrap_or(default_months);
            serde_json::to_value(service.preview(&company_id, &changes, months)?)?
        }
        IpcCommand::History { company_id, limit } => {
            serde_json::to_value(service.history(&company_id, limit)?)?
        }
        IpcCommand::Usage => serde_json::to_value(service.usage()?)?,
        IpcCommand::Health => serde_json::to_value(service.health())?,
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn run_once(service: &DeskService, args: &[String]) -> Result<()> {
    let Some(path) = flag_value(args, "--context") else {
        anyhow::bail!("one-shot mode needs --context <file.json> (or pass --ipc-mode)");
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let mut context: FinancialContext = serde_json::from_str(&content)?;
    if let Some(company) = flag_value(args, "--company") {
        context.company_id = company.to_string();
    }
    let stored = service.upload(context)?;

    let request = ScenarioRequest {
        company_id:              stored.company_id.clone(),
        spending_change_percent: parse_opt(args, "--spending")?,
        monthly_expenses:        parse_opt(args, "--expenses")?,
        pricing_change_percent:  parse_opt(args, "--pricing")?,
        hiring_count:            parse_opt(args, "--hires")?,
        marketing_budget:        parse_opt(args, "--marketing")?,
        months_to_forecast:      parse_opt(args, "--months")?,
    };

    match service.run_request(&request) {
        Ok(report) => print_summary(&report),
        Err(e) => anyhow::bail!("{}", e.user_message()),
    }
    Ok(())
}

fn print_summary(report: &ScenarioReport) {
    let before = &report.original_context;
    let after = &report.updated_context;
    let impact = &report.impact_analysis;
    let result = &report.result;

    println!("=== SCENARIO {} ===", result.scenario_id);
    println!("  company:        {}", result.company_id);
    println!("  revenue:        {:.0} -> {:.0} ({:+.0})", before.monthly_revenue, after.monthly_revenue, impact.revenue_change);
    println!("  expenses:       {:.0} -> {:.0} ({:+.0})", before.monthly_expenses, after.monthly_expenses, impact.expense_change);
    println!("  marketing:      {:.0} -> {:.0} ({:+.0})", before.marketing_spend, after.marketing_spend, impact.marketing_impact);
    println!("  profit impact:  {:+.0}/month", impact.profit_impact);
    println!("  runway:         {} -> {} months", fmt_runway(before.runway_months), fmt_runway(after.runway_months));
    println!("  health:         {:?} (score {:.0})", report.health.status, report.health.score);
    for alert in &report.health.alerts {
        println!("  alert:          [{:?}] {} ({})", alert.level, alert.message, alert.action);
    }

    println!();
    println!("=== FORECAST ({} months) ===", result.input.months_to_forecast);
    for m in &result.monthly_forecast {
        println!(
            "  M{:>3} | revenue {:>12.0} | expenses {:>12.0} | net {:>+12.0} | balance {:>14.0}",
            m.month, m.revenue, m.expenses, m.net_income, m.balance
        );
    }
    println!("  months of runway:   {}", result.total_months_of_runway);
    println!("  final cash balance: {:.0}", result.final_cash_balance);
}

fn fmt_runway(months: f64) -> String {
    if months.is_finite() {
        format!("{months:.1}")
    } else {
        "unbounded".to_string()
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_opt<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    flag_value(args, flag)
        .map(|v| v.parse().map_err(|e| anyhow::anyhow!("Bad value for {flag} '{v}': {e}")))
        .transpose()
}
