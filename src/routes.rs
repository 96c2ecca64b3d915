use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

use crate::{
    api::{attendance, employee, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let clock_limiter = Arc::new(build_limiter(config.rate_clock_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Kiosk routes: PIN-gated in the handler, no bearer token.
    cfg.service(
        web::scope("/attendance")
            .service(
                web::resource("/clock-in")
                    .wrap(clock_limiter.clone())
                    .route(web::post().to(attendance::clock_in)),
            )
            .service(
                web::resource("/clock-out")
                    .wrap(clock_limiter)
                    .route(web::post().to(attendance::clock_out)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/status").route(web::get().to(attendance::status)),
                    )
                    .service(
                        web::resource("/status/{id}")
                            .route(web::get().to(attendance::status_one)),
                    )
                    .service(
                        web::resource("/records")
                            .route(web::get().to(attendance::records_by_date)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("").route(web::get().to(report::range_report)))
                    .service(
                        web::resource("/summary").route(web::get().to(report::daily_summary)),
                    )
                    .service(
                        web::resource("/sessions")
                            .route(web::get().to(report::detailed_sessions)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(report::delete_record))),
            )
            .service(
                web::scope("/auth").service(
                    web::resource("/forgot-password")
                        .route(web::post().to(handlers::forgot_password)),
                ),
            ),
    );
}
