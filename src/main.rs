pub mod app;
pub mod renderer;

use app::App;
use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    App::run()
}
