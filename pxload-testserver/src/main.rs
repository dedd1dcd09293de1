use std::net::SocketAddr;

use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut proxy: Option<pxload_testserver::ProxyMode> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--proxy" => {
                proxy = Some(pxload_testserver::ProxyMode::open());
            }
            "--proxy-auth" => {
                let creds = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--proxy-auth requires USER:PASS"))?;
                let (user, pass) = creds
                    .split_once(':')
                    .ok_or_else(|| anyhow::anyhow!("--proxy-auth expects USER:PASS"))?;
                proxy = Some(pxload_testserver::ProxyMode::basic(user, pass));
            }
            "-h" | "--help" => {
                eprintln!(
                    "pxload-testserver\n\nUSAGE:\n  pxload-testserver [--bind 127.0.0.1:0] [--proxy | --proxy-auth USER:PASS]\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = pxload_testserver::TestServerStats::default();
    let app = pxload_testserver::router(stats, proxy);

    println!("HTTP_URL=http://{addr}");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
    });

    serve.await?;
    Ok(())
}
