use crate::api::{attendance, employee, report};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::anyhow;
use std::sync::Arc;

pub type RateLimiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter shared by every worker.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Arc<RateLimiter>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / u64::from(requests_per_min);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))?;

    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: Arc<RateLimiter>) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(limiter) // rate limiting
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    // /employee/{id}/promote
                    .service(
                        web::resource("/{id}/promote")
                            .route(web::put().to(employee::promote_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::mark_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // fixed segments before /{date}
                    .service(
                        web::resource("/template").route(web::get().to(attendance::attendance_form)),
                    )
                    .service(
                        web::resource("/missing")
                            .route(web::get().to(attendance::missing_attendance)),
                    )
                    .service(
                        web::resource("/export").route(web::get().to(attendance::export_attendance)),
                    )
                    // /attendance/{date}
                    .service(
                        web::resource("/{date}")
                            .route(web::get().to(attendance::get_attendance_day))
                            .route(web::delete().to(attendance::delete_attendance_day)),
                    ),
            )
            .service(
                web::scope("/report")
                    .service(web::resource("/monthly").route(web::get().to(report::monthly)))
                    .service(
                        web::resource("/monthly/export").route(web::get().to(report::monthly_export)),
                    )
                    .service(web::resource("/department").route(web::get().to(report::department)))
                    .service(web::resource("/summary").route(web::get().to(report::summary)))
                    .service(web::resource("/daily").route(web::get().to(report::daily)))
                    .service(
                        web::resource("/employee/{id}").route(web::get().to(report::employee)),
                    )
                    .service(
                        web::resource("/anomalies/{id}").route(web::get().to(report::anomalies)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{MemoryStore, Store};
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::{Value, json};
    use std::net::SocketAddr;

    fn peer() -> SocketAddr {
        "127.0.0.1:12345".parse().unwrap()
    }

    macro_rules! app {
        () => {
            app!(MemoryStore::new())
        };
        ($store:expr) => {{
            let limiter = build_limiter(1_000).unwrap();
            test::init_service(
                App::new()
                    .app_data(Data::new(Store::Memory($store)))
                    .app_data(Data::new(Config::default()))
                    .configure(|cfg| configure(cfg, "/api", limiter.clone())),
            )
            .await
        }};
    }

    fn employee_body(id: &str, name: &str, department: &str) -> Value {
        json!({
            "employee_id": id,
            "name": name,
            "email": format!("{}@example.com", id.to_lowercase()),
            "mobile": "0123456789",
            "department": department,
            "position": "Junior"
        })
    }

    #[actix_web::test]
    async fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
    }

    #[actix_web::test]
    async fn mark_then_report_flow() {
        let app = app!();

        for (id, name, dept) in [("E1", "Ada", "IT"), ("E2", "Bob", "HR")] {
            let req = test::TestRequest::post()
                .uri("/api/employee")
                .peer_addr(peer())
                .set_json(employee_body(id, name, dept))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let mark = json!({
            "date": "2024-02-05",
            "entries": [
                { "employee_id": "E1", "status": "Present", "check_in": "09:00", "check_out": "17:00" },
                { "employee_id": "E2", "status": "Half-Day" }
            ]
        });
        let req = test::TestRequest::post()
            .uri("/api/attendance")
            .peer_addr(peer())
            .set_json(&mark)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/attendance")
            .peer_addr(peer())
            .set_json(&mark)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri("/api/report/monthly?month=2024-02")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["end"], "2024-02-29");
        assert_eq!(body["days_recorded"], 1);
        assert_eq!(body["rows"][0]["employee_id"], "E1");
        assert_eq!(body["rows"][0]["attendance_percentage"], 100.0);
        assert_eq!(body["rows"][1]["half_day"], 1);
        assert_eq!(body["rows"][1]["attendance_percentage"], 0.0);

        let req = test::TestRequest::get()
            .uri("/api/report/department?start=2024-02-01&end=2024-02-29")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["IT"]["Present"], 1);
        assert_eq!(body["HR"]["Half-Day"], 1);
    }

    #[actix_web::test]
    async fn unknown_employee_is_rejected_when_marking() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/attendance")
            .peer_addr(peer())
            .set_json(json!({
                "date": "2024-02-05",
                "entries": [{ "employee_id": "GHOST", "status": "Present" }]
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn store_failure_is_503_without_details() {
        let store = MemoryStore::new();
        store.poison();
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri("/api/attendance?start=2024-02-01&end=2024-02-29")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Record store unavailable, try again later" }));
    }

    #[actix_web::test]
    async fn daily_report_lists_every_date() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/employee")
            .peer_addr(peer())
            .set_json(employee_body("E1", "Ada", "IT"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/attendance")
            .peer_addr(peer())
            .set_json(json!({
                "date": "2024-02-02",
                "entries": [{ "employee_id": "E1", "status": "Late", "check_in": "09:40" }]
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/report/daily?start=2024-02-01&end=2024-02-03")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({
                "2024-02-01": {},
                "2024-02-02": { "Late": 1 },
                "2024-02-03": {}
            })
        );
    }

    #[actix_web::test]
    async fn employee_report_as_json_carries_status_colours() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/employee")
            .peer_addr(peer())
            .set_json(employee_body("E1", "Ada", "IT"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/attendance")
            .peer_addr(peer())
            .set_json(json!({
                "date": "2024-02-02",
                "entries": [{ "employee_id": "E1", "status": "Absent" }]
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/report/employee/E1?start=2024-02-01&end=2024-02-29")
            .insert_header((actix_web::http::header::ACCEPT, "application/json"))
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "Attendance Report for Ada");
        assert_eq!(body["body"]["kind"], "table");
        let row = &body["body"]["pages"][0][0];
        assert_eq!(row["status"], "Absent");
        assert_eq!(row["colour"], "#c62828");
    }

    #[actix_web::test]
    async fn inverted_window_is_a_bad_request() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/attendance?start=2024-02-10&end=2024-02-01")
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn fixed_attendance_paths_win_over_date() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/employee")
            .peer_addr(peer())
            .set_json(employee_body("E1", "Ada", "IT"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/attendance/missing?date=2024-02-05")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["attendance_open"], false);
        assert_eq!(body["missing"][0]["employee_id"], "E1");

        let req = test::TestRequest::get()
            .uri("/api/attendance/template?date=2024-02-05")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["already_marked"], false);
        assert_eq!(body["entries"][0]["status"], "Present");
    }

    #[actix_web::test]
    async fn export_is_csv_attachment() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/attendance/export?start=2024-02-01&end=2024-02-29")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(actix_web::http::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"Date,ID,Name,Department,Status,Check-in,Check-out"));
    }

    #[actix_web::test]
    async fn employee_report_for_empty_window_says_so() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/report/employee/E9?start=2024-02-01&end=2024-02-29")
            .peer_addr(peer())
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Attendance Report for Unknown"));
        assert!(text.contains("No attendance records found for the selected period."));
    }

    #[actix_web::test]
    async fn anomaly_scan_needs_enough_records() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/report/anomalies/E1?start=2024-02-01&end=2024-02-29")
            .peer_addr(peer())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sufficient_data"], false);
        assert_eq!(body["min_records"], 10);
        assert!(body["anomalies"].is_null());
    }
}
