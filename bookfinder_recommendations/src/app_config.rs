use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::resource("/books/recommendations")
                .route(web::post().to(handlers::get_recommendations)),
        )
        .service(
            web::resource("/recommendations/filters").route(web::get().to(handlers::get_filters)),
        );
}
