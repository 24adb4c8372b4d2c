//! Property tests for value computation and profile selection

#[cfg(test)]
mod tests {
    use apolo_attributes::compute::sip_cid;
    use apolo_attributes::AttributeService;
    use apolo_cache::{DataManager, InternalDataDb};
    use apolo_core::consts::{META_CONSTANT, OPT_PROFILE_IDS};
    use apolo_core::models::{
        Attribute, AttributeProfile, CgrEvent, DataPoint, DynamicWeight, ValueExpr,
    };
    use apolo_core::AppConfig;
    use apolo_filters::{FilterS, TenantIndexer};
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    fn req_dp(fields: &[(&str, &str)]) -> DataPoint {
        let mut req = Map::new();
        for (k, v) in fields {
            req.insert(k.to_string(), Value::String(v.to_string()));
        }
        let mut dp = DataPoint::new();
        dp.set_namespace("*req", Value::Object(req));
        dp
    }

    fn select_winner(ids: Vec<String>, weights: Vec<i32>) -> String {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async move {
            let dm = Arc::new(DataManager::new(Arc::new(InternalDataDb::new()), true));
            for (id, w) in ids.iter().zip(&weights) {
                dm.replace_attribute_profile(&AttributeProfile {
                    tenant: "cgrates.org".into(),
                    id: id.clone(),
                    weights: vec![DynamicWeight {
                        filter_ids: vec![],
                        weight: f64::from(*w),
                    }],
                    attributes: vec![Attribute {
                        path: "*req.Winner".into(),
                        attr_type: META_CONSTANT.into(),
                        value: ValueExpr::constant(id),
                        ..Default::default()
                    }],
                    ..Default::default()
                })
                .await
                .unwrap();
            }
            let svc = AttributeService::new(
                dm.clone(),
                Arc::new(FilterS::new()),
                Arc::new(TenantIndexer::new(dm)),
                &AppConfig::default(),
            )
            .unwrap();

            let ev = CgrEvent {
                tenant: "cgrates.org".into(),
                id: "ev1".into(),
                api_opts: json!({ OPT_PROFILE_IDS: ids })
                    .as_object()
                    .cloned()
                    .unwrap(),
                ..Default::default()
            };
            let reply = svc.process_event(&ev).await.unwrap();
            reply.altered_fields[0].matched_profile_id.clone()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_sipcid_ignores_participant_order(
            call_id in "[a-z0-9]{1,10}",
            a in "[a-z0-9]{1,8}",
            b in "[a-z0-9]{1,8}",
        ) {
            let dp = req_dp(&[("CallID", &call_id), ("From", &a), ("To", &b)]);
            let forward = ValueExpr::parse("~*req.CallID;~*req.From;~*req.To").unwrap();
            let backward = ValueExpr::parse("~*req.CallID;~*req.To;~*req.From").unwrap();

            let f = sip_cid(&forward, &dp).unwrap();
            let r = sip_cid(&backward, &dp).unwrap();
            prop_assert!(f.complete);
            prop_assert_eq!(&f.value, &r.value);
            let prefix = format!("{};", call_id);
            prop_assert!(f.value.starts_with(&prefix));
        }

        #[test]
        fn prop_selection_ignores_candidate_order(
            weights in proptest::collection::vec(0i32..3, 2..6),
            rotate in 0usize..6,
        ) {
            let ids: Vec<String> = (0..weights.len()).map(|i| format!("ATTR_{}", i)).collect();

            let mut rotated_ids = ids.clone();
            let mut rotated_weights = weights.clone();
            let r = rotate % ids.len();
            rotated_ids.rotate_left(r);
            rotated_weights.rotate_left(r);

            let max = *weights.iter().max().unwrap();
            let expected = ids
                .iter()
                .zip(&weights)
                .filter(|(_, w)| **w == max)
                .map(|(id, _)| format!("cgrates.org:{}", id))
                .min()
                .unwrap();

            prop_assert_eq!(select_winner(ids, weights), expected.clone());
            prop_assert_eq!(select_winner(rotated_ids, rotated_weights), expected);
        }
    }
}
