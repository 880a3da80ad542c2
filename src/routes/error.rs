use crate::error::app_error::ErrorBody;
use rocket::http::ContentType;
use rocket::{Request, catch};

type CatcherBody = (ContentType, String);

fn body(msg: &str) -> CatcherBody {
    (ContentType::JSON, ErrorBody::json(msg))
}

#[catch(400)]
pub fn bad_request(_: &Request) -> CatcherBody {
    body("Bad request")
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> CatcherBody {
    body("Not authorized, token missing or invalid")
}

#[catch(404)]
pub fn not_found(_: &Request) -> CatcherBody {
    body("Not found")
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> CatcherBody {
    body("Request body is too large")
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> CatcherBody {
    body("Invalid request parameters")
}

#[catch(500)]
pub fn internal_error(_: &Request) -> CatcherBody {
    body("Internal server error")
}
