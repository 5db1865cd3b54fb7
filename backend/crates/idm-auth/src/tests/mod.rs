
use http::HeaderMap;
use http::header::AUTHORIZATION;

pub(crate) fn headers_with_authorization(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value.parse().unwrap());
    headers
}
