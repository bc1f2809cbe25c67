use viz::app::runner;
use viz::FluidApp;

fn main() {
    env_logger::init();
    runner::run::<FluidApp>()
}
