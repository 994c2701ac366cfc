use log::error;
use std::env;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .cloned()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = compound::api::run_http_server(port).await {
            error!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match compound::api::run_cli(raw_args) {
        Ok(output) => print!("{output}"),
        Err(msg) => {
            eprintln!("{}", msg.trim_end());
            std::process::exit(2);
        }
    }
}
