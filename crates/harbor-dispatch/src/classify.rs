// Harbor - S3-compatible replicating reverse proxy
// Copyright (C) 2026 Harbor Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Pure request/response classification used to pick clients and pickers.

use harbor_backend::{ProxyRequest, ProxyResponse};
use http::Method;
use xml::reader::{EventReader, XmlEvent};

/// True if the path suffix marks a multipart-upload initiate request.
pub fn is_initiate_request(req: &ProxyRequest) -> bool {
    req.raw_query() == "uploads"
}

/// True if the query string carries an `uploadId=` key, marking a part/complete/abort
/// request for an existing multipart upload.
pub fn contains_upload_id(req: &ProxyRequest) -> bool {
    req.raw_query().contains("uploadId=")
}

/// True for any request belonging to a multipart upload: initiate, upload-part, complete, or
/// abort.
pub fn is_multipart_upload_request(req: &ProxyRequest) -> bool {
    is_initiate_request(req) || contains_upload_id(req)
}

/// True if the path addresses a bucket rather than an object: exactly one path segment once
/// the leading slash is stripped.
pub fn is_bucket_path(path: &str) -> bool {
    !path.trim_start_matches('/').contains('/')
}

/// True if `req` is a `CompleteMultipartUpload` call: carries `uploadId=` and is a `POST`.
pub fn is_complete_multipart_request(req: &ProxyRequest) -> bool {
    req.method == Method::POST && contains_upload_id(req)
}

/// The complete-success predicate from the multipart contract: status 200, no `partNumber=`
/// in the query (that would mean this was an upload-part response, not a complete), and a
/// body that XML-parses as a `CompleteMultipartUploadResult` with a non-empty `Location`.
pub fn is_complete_upload_response_successful(req: &ProxyRequest, resp: &ProxyResponse) -> bool {
    resp.status.as_u16() == 200
        && !req.raw_query().contains("partNumber=")
        && response_contains_complete_upload_result(&resp.body)
}

fn response_contains_complete_upload_result(body: &[u8]) -> bool {
    let reader = EventReader::new(body);
    let mut in_result = false;
    let mut in_location = false;
    let mut saw_result_root = false;
    let mut location_text = String::new();

    for event in reader {
        match event {
            Ok(XmlEvent::StartElement { name, .. }) => {
                if name.local_name == "CompleteMultipartUploadResult" {
                    in_result = true;
                    saw_result_root = true;
                } else if in_result && name.local_name == "Location" {
                    in_location = true;
                }
            }
            Ok(XmlEvent::Characters(text)) if in_location => {
                location_text.push_str(&text);
            }
            Ok(XmlEvent::EndElement { name }) => {
                if name.local_name == "Location" {
                    in_location = false;
                } else if name.local_name == "CompleteMultipartUploadResult" {
                    in_result = false;
                }
            }
            Err(_) => return false,
            _ => {}
        }
    }

    saw_result_root && !location_text.trim().is_empty()
}
