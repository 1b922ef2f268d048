//! SOAP 1.1 request envelopes for the SellerDynamics service.

use sdsync_core::Credentials;

use crate::types::{OperationParams, PageRequest, SERVICE_NAMESPACE};

fn element(out: &mut String, name: &str, value: &str) {
    out.push_str("      <");
    out.push_str(name);
    out.push('>');
    out.push_str(value);
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

/// Builds the request envelope for one page.
///
/// Credential values are inserted verbatim. The encrypted login comes from
/// SellerDynamics as an opaque base64 token and must reach the service
/// byte-for-byte.
#[must_use]
pub fn build_envelope(request: &PageRequest, credentials: &Credentials) -> String {
    let operation = request.operation.name();

    let mut params = String::new();
    element(&mut params, "encryptedLogin", credentials.encrypted_login());
    element(&mut params, "retailerId", credentials.retailer_id());
    if let OperationParams::Orders {
        order_type,
        from_date,
        to_date,
    } = &request.params
    {
        element(&mut params, "orderType", order_type.as_str());
        element(&mut params, "fromDate", &from_date.format("%Y-%m-%d").to_string());
        element(&mut params, "toDate", &to_date.format("%Y-%m-%d").to_string());
    }
    element(&mut params, "pageNumber", &request.page_number.to_string());
    element(&mut params, "pageSize", &request.page_size.to_string());

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{operation} xmlns="{SERVICE_NAMESPACE}">
{params}    </{operation}>
  </soap:Body>
</soap:Envelope>"#
    )
}
