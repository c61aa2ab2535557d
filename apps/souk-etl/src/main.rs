use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = souk_etl::Args::parse();
	souk_etl::run(args).await
}
