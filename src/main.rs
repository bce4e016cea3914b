#[cfg(feature = "testkit")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wayrunner::cli::run().await
}

#[cfg(not(feature = "testkit"))]
fn main() {
    eprintln!("wayrunner was built without the `testkit` feature; the demo CLI has nothing to drive the engine with.");
    std::process::exit(1);
}
