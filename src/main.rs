use overleaf_mover::overleaf_mover_main;
use std::process::exit;

#[tokio::main]
async fn main() {
    println!(concat!(
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    ));
    dotenv::dotenv().ok();
    match overleaf_mover_main().await {
        Ok(_) => {
            exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // needs a real Overleaf project and a GitLab token
    async fn test_main() {
        dotenv::dotenv().ok();
        overleaf_mover_main().await.unwrap();
    }
}
