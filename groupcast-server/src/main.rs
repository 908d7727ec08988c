use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use groupcast_common::models::TrackedInstance;
use groupcast_core::tasks::status_polling::InstanceStatusPoller;
use groupcast_core::Error;

mod context;
use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "groupcast")]
#[command(author, version, about = "Groupcast - WhatsApp instance status reconciler")]
pub struct Args {
    /// Mode: "server" (poll until Ctrl-C), "check" (poll once) or "groups"
    #[arg(long, env = "GROUPCAST_MODE", default_value = "server")]
    mode: String,

    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://groupcast@localhost:5432/groupcast")]
    db_url: String,

    /// Base URL of the UAZAPI gateway server.
    #[arg(long, env = "UAZAPI_BASE_URL", default_value = "https://free.uazapi.com")]
    gateway_url: String,

    /// Per-request timeout for gateway calls, in seconds.
    #[arg(long, env = "UAZAPI_TIMEOUT_SECS", default_value_t = 15)]
    gateway_timeout_secs: u64,

    /// Seconds between status polls.
    #[arg(long, env = "STATUS_POLL_INTERVAL_SECS", default_value_t = 30)]
    poll_interval_secs: u64,

    /// Only track instances of this organization.
    #[arg(long, env = "GROUPCAST_ORGANIZATION_ID")]
    organization_id: Option<i64>,

    /// Instance whose groups are listed in "groups" mode.
    #[arg(long)]
    instance_id: Option<i64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("groupcast=info"));
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global tracing subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("Groupcast starting. mode={}, organization_id={:?}", args.mode, args.organization_id);

    let result = match args.mode.as_str() {
        "server" => run_server(args).await,
        "check" => run_check(args).await,
        "groups" => run_groups(args).await,
        other => Err(Error::Config(format!(
            "Invalid mode '{}'. Use --mode=server, --mode=check or --mode=groups.",
            other
        ))),
    };

    if let Err(e) = result {
        error!("Fatal error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn build_poller(args: &Args, ctx: &ServerContext) -> Result<Arc<InstanceStatusPoller>, Error> {
    if args.poll_interval_secs == 0 {
        return Err(Error::Config("poll interval must be at least one second".into()));
    }
    let poller = Arc::new(InstanceStatusPoller::new(
        ctx.reconciler.clone(),
        Duration::from_secs(args.poll_interval_secs),
    ));

    let instances = ctx.instance_repo.list_instances(args.organization_id).await?;
    info!("Loaded {} WhatsApp instance(s).", instances.len());
    if instances.is_empty() {
        warn!("No instances to track; the poller will stay idle.");
    }
    poller.set_instances(instances).await;
    Ok(poller)
}

async fn run_server(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;
    let poller = build_poller(&args, &ctx).await?;
    let handle = poller.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; stopping status poller...");
    handle.shutdown().await;

    if let Some(primary) = poller.primary_instance().await {
        info!("Last known primary instance: {}", describe(&primary));
    }
    Ok(())
}

async fn run_check(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;
    let poller = build_poller(&args, &ctx).await?;

    let checked = poller.refresh().await;
    for tracked in &checked {
        println!("{}", describe(tracked));
    }
    let snapshot = poller.snapshot().await;
    if let Some(at) = snapshot.last_check {
        println!("last check: {}", at.to_rfc3339());
    }
    if ctx.reconciler.all_offline() {
        println!("no instance is connected");
    }
    Ok(())
}

async fn run_groups(args: Args) -> Result<(), Error> {
    let instance_id = args
        .instance_id
        .ok_or_else(|| Error::Config("--instance-id is required in groups mode".into()))?;
    let ctx = ServerContext::new(&args).await?;

    let instance = ctx
        .instance_repo
        .get_instance(instance_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("whatsapp instance id={}", instance_id)))?;
    let token = instance
        .credential()
        .ok_or_else(|| Error::Config(format!("instance id={} has no API key", instance_id)))?;

    let groups = ctx.gateway.list_groups(token).await?;
    for g in &groups {
        println!(
            "{}\t{}\t{}",
            g.id,
            g.name,
            g.participants.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
        );
    }
    info!("{} group(s) for instance id={}", groups.len(), instance_id);
    Ok(())
}

fn describe(t: &TrackedInstance) -> String {
    format!(
        "#{} {} [{}] phone={} profile={}",
        t.instance.id,
        t.instance.name,
        t.instance.connection_status(),
        t.instance.phone_number.as_deref().unwrap_or("-"),
        t.instance.profile_name.as_deref().unwrap_or("-"),
    )
}
