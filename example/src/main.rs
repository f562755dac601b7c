use tracing::trace_span;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use postcode::Result;

mod server;
mod params;
mod rows;
mod recover;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    trace_span!("params").in_scope(params::main)?;
    trace_span!("rows").in_scope(rows::main)?;
    trace_span!("recover").in_scope(recover::main)?;

    Ok(())
}
