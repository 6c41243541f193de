mod app;
mod config;

use app::{App, AppEvent};
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load_settings()?;
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let app = App::new(settings, event_loop.create_proxy())?;
    app.run(event_loop)?;

    Ok(())
}
