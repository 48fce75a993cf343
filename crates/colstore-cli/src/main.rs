use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    colstore_cli::cli::run()
}
