//! Integration tests for the attribute HTTP handlers
//!
//! Each test builds the full route table over an in-memory profile store.

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use apolo_api::configure_routes;
    use apolo_attributes::AttributeService;
    use apolo_cache::{DataManager, InternalDataDb};
    use apolo_core::models::{Attribute, AttributeProfile, DynamicWeight, ValueExpr};
    use apolo_core::AppConfig;
    use apolo_filters::{FilterS, TenantIndexer};
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn service() -> web::Data<AttributeService> {
        let dm = Arc::new(DataManager::new(Arc::new(InternalDataDb::new()), true));
        dm.set_attribute_profile(AttributeProfile {
            tenant: "cgrates.org".into(),
            id: "ATTR_1".into(),
            filter_ids: vec!["*string:~*req.Field1:Value1".into()],
            weights: vec![DynamicWeight {
                filter_ids: vec![],
                weight: 10.0,
            }],
            attributes: vec![Attribute {
                path: "*req.Field2".into(),
                attr_type: "*variable".into(),
                value: ValueExpr::parse("~*req.Field1").unwrap(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .await
        .unwrap();

        let svc = AttributeService::new(
            dm.clone(),
            Arc::new(FilterS::new()),
            Arc::new(TenantIndexer::new(dm)),
            &AppConfig::default(),
        )
        .unwrap();
        web::Data::new(svc)
    }

    async fn call(body: Value) -> Value {
        let app = test::init_service(
            App::new()
                .app_data(service().await)
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/jsonrpc")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        test::read_body_json(resp).await
    }

    fn event(fields: Value) -> Value {
        json!({"Tenant": "cgrates.org", "ID": "ev1", "Event": fields, "APIOpts": {}})
    }

    #[actix_rt::test]
    async fn test_ping() {
        let resp = call(json!({"jsonrpc": "2.0", "method": "AttributeSv1.Ping", "params": [], "id": 1})).await;
        assert_eq!(resp, json!({"jsonrpc": "2.0", "result": "Pong", "id": 1}));
    }

    #[actix_rt::test]
    async fn test_process_event() {
        let resp = call(json!({
            "jsonrpc": "2.0",
            "method": "AttributeSv1.ProcessEvent",
            "params": [event(json!({"Field1": "Value1"}))],
            "id": 2
        }))
        .await;

        assert!(resp.get("error").is_none());
        let result = &resp["result"];
        assert_eq!(
            result["AlteredFields"],
            json!([{"MatchedProfileID": "cgrates.org:ATTR_1", "Fields": ["*req.Field2"]}])
        );
        assert_eq!(result["CGREvent"]["Event"]["Field2"], json!("Value1"));
        assert_eq!(result["CGREvent"]["Tenant"], json!("cgrates.org"));
    }

    #[actix_rt::test]
    async fn test_process_event_not_found() {
        let resp = call(json!({
            "method": "AttributeSv1.ProcessEvent",
            "params": [event(json!({"Field1": "Other"}))],
            "id": 3
        }))
        .await;
        assert_eq!(resp["error"], json!({"code": -32000, "message": "NOT_FOUND"}));
        assert!(resp.get("result").is_none());
    }

    #[actix_rt::test]
    async fn test_missing_event_param() {
        for params in [json!([]), json!([null])] {
            let resp = call(json!({
                "method": "AttributeSv1.ProcessEvent",
                "params": params,
                "id": 4
            }))
            .await;
            assert_eq!(
                resp["error"]["message"],
                json!("MANDATORY_IE_MISSING: [CGREvent]")
            );
        }
    }

    #[actix_rt::test]
    async fn test_bad_option_is_returned_verbatim() {
        let mut ev = event(json!({"Field1": "Value1"}));
        ev["APIOpts"] = json!({"*processRuns": "many"});
        let resp = call(json!({
            "method": "AttributeSv1.ProcessEvent",
            "params": [ev],
            "id": 5
        }))
        .await;
        assert_eq!(
            resp["error"]["message"],
            json!("cannot convert field: many to int")
        );
    }

    #[actix_rt::test]
    async fn test_get_attribute_for_event() {
        let resp = call(json!({
            "method": "AttributeSv1.GetAttributeForEvent",
            "params": [event(json!({"Field1": "Value1"}))],
            "id": 6
        }))
        .await;
        let result = &resp["result"];
        assert_eq!(result["ID"], json!("ATTR_1"));
        assert_eq!(result["Attributes"][0]["Path"], json!("*req.Field2"));
        assert_eq!(result["Attributes"][0]["Value"], json!("~*req.Field1"));
    }

    #[actix_rt::test]
    async fn test_unknown_method() {
        let resp = call(json!({"method": "AttributeSv1.Nope", "params": [], "id": 7})).await;
        assert_eq!(resp["error"]["code"], json!(-32601));
    }

    #[actix_rt::test]
    async fn test_malformed_body() {
        let app = test::init_service(
            App::new()
                .app_data(service().await)
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/jsonrpc")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], json!(-32700));
    }

    #[actix_rt::test]
    async fn test_plain_json_endpoints() {
        let app = test::init_service(
            App::new()
                .app_data(service().await)
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/attributes/process")
            .set_json(event(json!({"Field1": "Value1"})))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/v1/attributes/process")
            .set_json(event(json!({"Field1": "Other"})))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("not_found"));
        assert_eq!(body["message"], json!("NOT_FOUND"));
    }

    #[actix_rt::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], json!("healthy"));
    }
}
