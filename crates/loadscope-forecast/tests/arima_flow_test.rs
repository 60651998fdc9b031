// End-to-end ARIMA flow against a scripted stand-in for the stats server.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use loadscope_forecast::{forecast_load, SessionPool};

/// Accepts connections, records every command, and replies "ok" to all
/// commands except the mean extraction, which returns a numeric vector.
async fn spawn_scripted_server(mean_reply: &'static str) -> (std::net::SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&commands);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut lines = BufReader::new(read_half).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let reply = if line == "as.numeric(data$mean)" {
                        mean_reply
                    } else {
                        "ok"
                    };
                    log.lock().unwrap().push(line);
                    if write_half
                        .write_all(format!("{reply}\n").as_bytes())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
    });

    (addr, commands)
}

#[tokio::test]
async fn forecast_issues_the_evaluation_sequence() {
    let (addr, commands) = spawn_scripted_server("[1] 120.5 130 -20").await;
    let pool = SessionPool::connect(&addr.ip().to_string(), addr.port(), 1)
        .await
        .unwrap();

    let lease = pool.acquire().await.unwrap();
    let forecast = forecast_load(&lease, &[45.0, 55.0, 120.0], 3).await.unwrap();
    assert_eq!(forecast, vec![120.5, 130.0, -20.0]);

    let seen = commands.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "library(forecast)".to_string(),
            "tsData = ts(c(45,55,120))".to_string(),
            "model = auto.arima(tsData, seasonal=FALSE, stepwise=TRUE)".to_string(),
            "data = forecast(model, h=3)".to_string(),
            "as.numeric(data$mean)".to_string(),
        ]
    );
}

#[tokio::test]
async fn evaluation_error_reply_surfaces_and_frees_the_session() {
    let (addr, _) = spawn_scripted_server("Error in auto.arima: series too short").await;
    let pool = SessionPool::connect(&addr.ip().to_string(), addr.port(), 1)
        .await
        .unwrap();

    {
        let lease = pool.acquire().await.unwrap();
        // The scripted server only errors on the mean extraction.
        let result = forecast_load(&lease, &[1.0], 2).await;
        assert!(result.is_err());
    }

    // The failing lease must have returned its session to the pool.
    let lease = pool.acquire().await.unwrap();
    assert!(lease.eval("1 + 1").await.is_ok());
}
