use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::loan::create_loan,
        api::loan::renew_loan,
        api::loan::return_loan,
        api::loan::list_active_loans,
        api::loan::list_overdue_loans,
        api::loan::list_history,
        api::patron::list_patrons,
        api::patron::register_patron,
        api::patron::login,
        api::patron::get_patron,
        api::patron::update_patron,
        api::patron::patron_loans,
        api::patron::patron_history,
        api::patron::patron_stats,
        api::patron::readers_report,
        api::patron::list_patron_stats,
        api::book::list_books,
        api::book::list_available_books,
        api::book::create_book,
        api::book::get_book,
        api::book::update_book,
        api::book::delete_book,
        api::category::list_categories,
    ),
    tags(
        (name = "biblioteca", description = "Library circulation API")
    )
)]
pub struct ApiDoc;
