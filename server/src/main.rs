use clap::Parser;
use server::network::Server;

/// Command-line options for the backend.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "8443")]
    port: u16,
    /// Number of concurrent game sessions
    #[clap(short, long, default_value = "1")]
    sessions: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let server = Server::bind(&address, args.sessions).await?;
    server.run().await
}
