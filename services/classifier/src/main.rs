use std::panic::{self, AssertUnwindSafe};

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use shared::config::Settings;
use shared::dto::{ErrorResponse, PredictRequest, PredictResponse};
use shared::predictor::Predictor;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const INDEX_HTML: &str = include_str!("../static/index.html");

async fn health() -> impl Responder {
    "OK"
}

async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

fn error_body(message: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        error: message.into(),
    }
}

async fn predict(
    predictor: web::Data<Predictor>,
    req: web::Json<PredictRequest>,
) -> HttpResponse {
    let req = req.into_inner();
    if req.question1.trim().is_empty() || req.question2.trim().is_empty() {
        return HttpResponse::BadRequest().json(error_body("both questions are required"));
    }

    // A panic in feature extraction must not take the worker down.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        predictor.predict(&req.question1, &req.question2)
    }));
    match outcome {
        Ok(Ok(prediction)) => {
            info!(verdict = %prediction.verdict, probability = prediction.probability, "classified pair");
            HttpResponse::Ok().json(PredictResponse {
                verdict: prediction.verdict,
                is_duplicate: prediction.verdict.is_duplicate(),
                probability: prediction.probability,
            })
        }
        Ok(Err(e)) => {
            warn!(%e, "prediction failed");
            HttpResponse::InternalServerError().json(error_body(format!("prediction failed: {e}")))
        }
        Err(_) => {
            error!("prediction panicked");
            HttpResponse::InternalServerError()
                .json(error_body("prediction failed: internal error"))
        }
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/predict", web::post().to(predict))
        .route("/health", web::get().to(health));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    info!("starting classifier service");

    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            error!(%e, "failed to load settings");
            std::process::exit(1);
        }
    };

    let predictor = match Predictor::load(&settings.model_path, &settings.vectorizer_path) {
        Ok(p) => web::Data::new(p),
        Err(e) => {
            error!(%e, "failed to load model artifacts");
            std::process::exit(1);
        }
    };

    info!(bind = %settings.http_bind, port = settings.http_port, "listening");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(predictor.clone())
            .configure(routes)
    })
    .bind((settings.http_bind.as_str(), settings.http_port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use shared::dataset::Dataset;
    use shared::dto::Verdict;
    use shared::features::FeatureConfig;
    use shared::forest::ForestParams;
    use shared::training::{self, TrainingOptions};

    const CSV: &str = "\
id,qid1,qid2,question1,question2,is_duplicate
0,1,2,How do I learn Rust?,How can I learn Rust?,1
1,3,4,What is the capital of France?,How tall is Mount Everest?,0
2,5,6,How do I cook rice?,What is the best way to cook rice?,1
3,7,8,Why is the sky blue?,Who won the world cup in 2014?,0
4,9,10,How do I lose weight fast?,How can I lose weight quickly?,1
5,11,12,What is a black hole?,Where can I buy cheap shoes?,0
";

    fn predictor() -> Predictor {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let options = TrainingOptions {
            sample_size: 100,
            random_state: 7,
            test_fraction: 0.0,
            max_features: 50,
            vocabulary_source: Default::default(),
            features: FeatureConfig::default(),
            forest: ForestParams {
                n_estimators: 5,
                ..ForestParams::default()
            },
        };
        let (model, vectorizer, _) = training::fit(dataset, &options).unwrap();
        Predictor::new(model, vectorizer)
    }

    #[actix_web::test]
    async fn health_ok() {
        let app = test::init_service(App::new().route("/health", web::get().to(health))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn index_serves_form() {
        let app = test::init_service(App::new().route("/", web::get().to(index))).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("question1"));
        assert!(html.contains("question2"));
    }

    #[actix_web::test]
    async fn predict_returns_verdict() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(predictor()))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(PredictRequest {
                question1: "How do I learn Rust?".into(),
                question2: "How do I learn Rust?".into(),
            })
            .to_request();
        let resp: PredictResponse = test::call_and_read_body_json(&app, req).await;
        assert!((0.0..=1.0).contains(&resp.probability));
        assert_eq!(resp.is_duplicate, resp.verdict == Verdict::Duplicate);
    }

    #[actix_web::test]
    async fn blank_question_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(predictor()))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(PredictRequest {
                question1: "   ".into(),
                question2: "What is Rust?".into(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("required"));
    }

    #[actix_web::test]
    async fn keeps_serving_after_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(predictor()))
                .configure(routes),
        )
        .await;
        for (q1, q2) in [("%$@<b>", "?!"), ("What is a black hole?", "What is a black hole")] {
            let req = test::TestRequest::post()
                .uri("/predict")
                .set_json(PredictRequest {
                    question1: q1.into(),
                    question2: q2.into(),
                })
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }
}
