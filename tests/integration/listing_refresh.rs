//! Integration tests for the exchange listing fetch and decode path

use alphasignal::services::listing::ListingClient;
use encoding_rs::EUC_KR;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn euc_kr_csv(csv: &str) -> Vec<u8> {
    let (bytes, _, _) = EUC_KR.encode(csv);
    bytes.into_owned()
}

#[tokio::test]
async fn fetches_and_decodes_euc_kr_listing() {
    let server = MockServer::start().await;

    let csv = "회사명,종목코드,업종\n삼성전자,5930,전자\n카카오,35720,서비스\n";
    Mock::given(method("GET"))
        .and(path("/listing.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(euc_kr_csv(csv), "text/csv; charset=EUC-KR"),
        )
        .mount(&server)
        .await;

    let client = ListingClient::new(&format!("{}/listing.csv", server.uri()));
    let stocks = client.fetch_listing().await.unwrap();

    assert_eq!(stocks.len(), 2);
    assert_eq!(stocks[0].name, "삼성전자");
    assert_eq!(stocks[0].code, "005930");
    assert_eq!(stocks[1].name, "카카오");
    assert_eq!(stocks[1].code, "035720");
}

#[tokio::test]
async fn failed_download_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing.csv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ListingClient::new(&format!("{}/listing.csv", server.uri()));
    assert!(client.fetch_listing().await.is_err());
}
