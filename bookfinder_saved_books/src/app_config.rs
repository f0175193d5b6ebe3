use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/saved-books")
                .service(
                    web::resource("/")
                        .route(web::get().to(handlers::list_saved_books))
                        .route(web::post().to(handlers::add_saved_book)),
                )
                .service(
                    web::resource("/{saved_book_id}")
                        .route(web::delete().to(handlers::remove_saved_book)),
                ),
        );
}
