use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = souk_mcp::Args::parse();
	souk_mcp::run(args).await
}
