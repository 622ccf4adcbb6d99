use ean_lookup::{EanPipeline, EtlEngine, LocalStorage, MissingPolicy, TomlConfig};
use httpmock::prelude::*;
use tempfile::TempDir;

fn write_config(temp_dir: &TempDir, endpoint: &str, policy: &str) -> TomlConfig {
    let base = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let toml_content = format!(
        r#"
[registry]
endpoint = "{endpoint}"
timeout_seconds = 5

[input]
path = "{base}/addresses.csv"

[dispatch]
concurrent_requests = 4
retry_attempts = 0

[output]
path = "{base}/out"
missing_policy = "{policy}"
"#
    );
    TomlConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_end_to_end_lookup_with_real_http() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "postalCode,streetNumber,streetNumberAddition,reference\n\
         2000BB,5,A,second\n\
         1234AB,10,,first\n\
         9999ZZ,1,,nowhere\n",
    )
    .unwrap();

    let server = MockServer::start();
    let elk_first = server.mock(|when, then| {
        when.method(GET)
            .path("/ecbinfoset")
            .query_param("product", "ELK")
            .query_param("postalCode", "1234AB")
            .query_param("streetNumber", "10");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "meteringPoints": [
                    {"ean": "871000000000000002", "product": "ELK", "specialMeteringPoint": true, "bagId": "0363"},
                    {"ean": "871000000000000001", "product": "ELK", "specialMeteringPoint": false, "bagId": "0363"}
                ]
            }));
    });
    let gas_first = server.mock(|when, then| {
        when.method(GET)
            .path("/ecbinfoset")
            .query_param("product", "GAS")
            .query_param("postalCode", "1234AB");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"meteringPoints": []}));
    });
    let elk_second = server.mock(|when, then| {
        when.method(GET)
            .path("/ecbinfoset")
            .query_param("product", "ELK")
            .query_param("postalCode", "2000BB")
            .query_param("streetNumberAddition", "A");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "meteringPoints": [{
                    "ean": "871000000000000010",
                    "product": "ELK",
                    "specialMeteringPoint": false,
                    "address": {"streetNumberAddition": "A"}
                }]
            }));
    });
    let gas_second = server.mock(|when, then| {
        when.method(GET)
            .path("/ecbinfoset")
            .query_param("product", "GAS")
            .query_param("postalCode", "2000BB");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "meteringPoints": [{
                    "ean": "871000000000000020",
                    "product": "GAS",
                    "specialMeteringPoint": false,
                    "address": {"streetNumberAddition": "A"}
                }]
            }));
    });
    // 9999ZZ 沒有 mock，httpmock 回 404 → 傳輸錯誤

    let config = write_config(&temp_dir, &server.url("/ecbinfoset"), "omit");
    let pipeline = EanPipeline::new(LocalStorage::new("."), config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    elk_first.assert();
    gas_first.assert();
    elk_second.assert();
    gas_second.assert();

    assert_eq!(outcome.records, 4);
    assert_eq!(outcome.missing.len(), 1);
    assert_eq!(outcome.missing[0].postal_code, "9999ZZ");

    let out_dir = temp_dir.path().join("out");
    let records = std::fs::read_to_string(out_dir.join("metering_data.csv")).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(
        lines,
        vec![
            "postalCode,streetNumber,streetNumberAddition,bagId,product,ean,specialMeteringPoint",
            "1234AB,10,,0363,ELK,871000000000000001,false",
            "1234AB,10,,0363,ELK,871000000000000002,true",
            "2000BB,5,A,,ELK,871000000000000010,false",
            "2000BB,5,A,,GAS,871000000000000020,false",
        ]
    );

    let missing = std::fs::read_to_string(out_dir.join("missing_addresses.csv")).unwrap();
    assert_eq!(missing, "postalCode,streetNumber\n9999ZZ,1\n");

    let summary: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("resolution_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["stats"]["addresses"], 3);
    assert_eq!(summary["stats"]["tasks"], 6);
    assert_eq!(summary["stats"]["transportErrors"], 2);
}

#[tokio::test]
async fn test_end_to_end_with_registry_outage() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "postalCode,streetNumber\n1234AB,10\n5678CD,20\n",
    )
    .unwrap();

    let server = MockServer::start();
    let outage = server.mock(|when, then| {
        when.method(GET).path("/ecbinfoset");
        then.status(503);
    });

    let config = write_config(&temp_dir, &server.url("/ecbinfoset"), "omit");
    let pipeline = EanPipeline::new(LocalStorage::new("."), config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    // 整批仍然完成，只是每個地址都變成警告
    outage.assert_hits(4);
    assert_eq!(outcome.records, 0);
    assert_eq!(outcome.missing.len(), 2);

    let records =
        std::fs::read_to_string(temp_dir.path().join("out").join("metering_data.csv")).unwrap();
    assert_eq!(records.lines().count(), 1);
}

#[tokio::test]
async fn test_end_to_end_placeholder_policy() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "postalCode,streetNumber\n1234AB,10\n",
    )
    .unwrap();

    let server = MockServer::start();
    let _elk = server.mock(|when, then| {
        when.method(GET).path("/ecbinfoset").query_param("product", "ELK");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "meteringPoints": [{"ean": "871234", "product": "ELK", "specialMeteringPoint": false}]
            }));
    });
    let _gas = server.mock(|when, then| {
        when.method(GET).path("/ecbinfoset").query_param("product", "GAS");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"meteringPoints": []}));
    });

    let config = write_config(&temp_dir, &server.url("/ecbinfoset"), "placeholder");
    assert_eq!(
        ean_lookup::core::ConfigProvider::missing_policy(&config),
        MissingPolicy::Placeholder
    );
    let pipeline = EanPipeline::new(LocalStorage::new("."), config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(outcome.records, 2);
    assert!(outcome.missing.is_empty());

    let records =
        std::fs::read_to_string(temp_dir.path().join("out").join("metering_data.csv")).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(lines[1], "1234AB,10,,,ELK,871234,false");
    assert_eq!(lines[2], "1234AB,10,,,GAS,,");
    assert!(!temp_dir.path().join("out").join("missing_addresses.csv").exists());
}

#[tokio::test]
async fn test_missing_columns_fail_before_any_lookup() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("addresses.csv"), "zip,number\n1234AB,10\n").unwrap();

    let server = MockServer::start();
    let any_call = server.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });

    let config = write_config(&temp_dir, &server.url("/ecbinfoset"), "omit");
    let pipeline = EanPipeline::new(LocalStorage::new("."), config).unwrap();
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    any_call.assert_hits(0);
    assert!(matches!(err, ean_lookup::EanError::MissingColumnsError { .. }));
    assert!(!temp_dir.path().join("out").exists());
}
