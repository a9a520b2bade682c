//! Tests for feed trigger routes

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::features::feeds::feeds_routes;
    use crate::ingest::{FeedKind, RunQueue, RunStatus, RunWorker};

    fn create_test_router(capacity: usize) -> (Router, RunQueue, RunWorker) {
        let (queue, worker) = RunQueue::new(capacity);
        (feeds_routes().with_state(queue.clone()), queue, worker)
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_trigger_queues_run() {
        let (app, queue, _worker) = create_test_router(4);

        let response = app.oneshot(request(Method::POST, "/vstar/run")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.starts_with("VStar run queued: "));

        let runs = queue.registry().list();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].feed, FeedKind::VStar);
        assert_eq!(runs[0].status, RunStatus::Queued);
        assert!(body.ends_with(&runs[0].run_id.to_string()));
    }

    #[tokio::test]
    async fn test_get_and_mixed_case_accepted() {
        let (app, queue, _worker) = create_test_router(4);

        let response = app.oneshot(request(Method::GET, "/PlaceExchange/run")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(queue.registry().list()[0].feed, FeedKind::PlaceExchange);
    }

    #[tokio::test]
    async fn test_unknown_feed_is_not_found() {
        let (app, queue, _worker) = create_test_router(4);

        let response = app.oneshot(request(Method::POST, "/doubleclick/run")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(queue.registry().list().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_is_unavailable() {
        let (app, queue, _worker) = create_test_router(1);
        queue.enqueue(FeedKind::SpringServe).unwrap();

        let response = app.oneshot(request(Method::POST, "/springserve/run")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_closed_queue_is_unavailable() {
        let (app, _queue, worker) = create_test_router(4);
        drop(worker);

        let response = app.oneshot(request(Method::POST, "/vstar/run")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
