// Queries the public NOAA air quality service. Run with `--ignored` when online.
use imageserver_rs::config::DEFAULT_SERVICE_URL;
use imageserver_rs::{Coordinates, ImageServerClient, Point};
use std::time::Duration;

#[tokio::test]
#[ignore]
async fn test_identify_noaa_pm25() {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = ImageServerClient::new(DEFAULT_SERVICE_URL, Some(Duration::from_secs(60)))
        .expect("Failed to create client");

    let info = client.service_info().await.expect("service info");
    assert!(info.name.is_some());

    let point = Point::new("Sacramento", Coordinates::wgs84(-121.49, 38.58));
    let result = client.identify(&point).await.expect("identify");
    assert!(!result.rasters.is_empty());
    assert!(result
        .rasters
        .windows(2)
        .all(|w| w[0].cmp_time(&w[1]) != std::cmp::Ordering::Greater));
}
