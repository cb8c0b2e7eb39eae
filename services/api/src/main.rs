use adhealth_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("adhealth error: {err}");
        std::process::exit(1);
    }
}
