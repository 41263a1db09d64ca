use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::telemetry;
use crate::telemetry::ops::init::Phase as InitPhase;

/// feedplace init (plan-only by default; use --apply to migrate)
#[derive(Args)]
pub struct InitCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

#[derive(Serialize)]
struct InitPlan {
    action: &'static str,
    migrations: Vec<String>,
}

#[derive(Serialize)]
struct InitResult {
    applied: bool,
}

pub async fn run(pool: &PgPool, args: InitCmd) -> Result<()> {
    let log = telemetry::init();
    let _g = log
        .root_span_kv([(
            "mode",
            if args.apply { "apply".to_string() } else { "plan".to_string() },
        )])
        .entered();

    let migrator = sqlx::migrate!();

    if !args.apply {
        let _s = log.span(&InitPhase::Plan).entered();
        let migrations: Vec<String> = migrator
            .iter()
            .map(|m| format!("{} {}", m.version, m.description))
            .collect();
        log.info("📝 Init plan, pending migrations:");
        for m in &migrations {
            log.info(format!("   {}", m));
        }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&InitPlan { action: "migrate", migrations })?;
        }
        return Ok(());
    }

    let _s = log.span(&InitPhase::Migrate).entered();
    migrator.run(pool).await?;
    log.info("✅ Database initialized");
    if telemetry::config::json_mode() {
        log.result(&InitResult { applied: true })?;
    }
    Ok(())
}
