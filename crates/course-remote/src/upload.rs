//! Course file upload
//!
//! Uploading takes three requests: announce the file to the course, POST the
//! bytes as multipart form data to the upload URL the announcement returned,
//! then follow the redirect the upload answers with (authenticated) to
//! confirm it. A direct 2xx answer to the upload is accepted as the final
//! file record.

use std::path::Path;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::Api;
use crate::cache::{CollectionCache, Mutation};
use crate::error::{Error, Result, excerpt};
use crate::http::{HttpMethod, HttpRequest, MultipartForm};
use crate::resource::{Collection, RemoteResource, ResourceKind, ResourcePath};

/// Id of the course's root folder (the folder without a parent).
pub fn root_folder(api: &Api, cache: &CollectionCache, course: &ResourcePath) -> Result<Option<String>> {
    let folders = cache.list(api, &course.collection(ResourceKind::Folder))?;
    Ok(folders
        .iter()
        .find(|f| f.data.get("parent_folder_id").is_none_or(Value::is_null))
        .map(RemoteResource::id))
}

/// Upload a local file into a course's root folder, replacing a file of
/// the same name.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the course has no root
/// folder, or any of the three requests is rejected.
pub fn upload_course_file(
    api: &Api,
    cache: &CollectionCache,
    course: &ResourcePath,
    path: &Path,
) -> Result<Mutation<RemoteResource>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Encode(format!("not a file path: {}", path.display())))?;
    let content = course_fs::io::read_bytes(path)?;
    upload_bytes(api, cache, course, &name, content)
}

/// Upload in-memory content as a course file named `name`.
pub fn upload_bytes(
    api: &Api,
    cache: &CollectionCache,
    course: &ResourcePath,
    name: &str,
    content: Vec<u8>,
) -> Result<Mutation<RemoteResource>> {
    let files = course.collection(ResourceKind::File);
    let folder = root_folder(api, cache, course)?
        .ok_or_else(|| Error::unexpected(course.to_string(), "course has no root folder"))?;

    let announce = json!({
        "name": name,
        "size": content.len(),
        "parent_folder_id": folder,
        "on_duplicate": "overwrite",
    });
    let ticket = api.post_json(&files.segments(), &announce)?;
    let upload_url = ticket
        .get("upload_url")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::unexpected(files.to_string(), "announcement without upload_url"))?;
    debug!(name, url = upload_url, "Upload announced");

    let params = ticket.get("upload_params").and_then(Value::as_object);
    let form = upload_form(params.into_iter().flatten(), name, content);
    let response = api.send(HttpRequest::new(HttpMethod::Post, upload_url).multipart(form))?;

    let record = if response.is_redirect() {
        let location = response
            .header("location")
            .ok_or_else(|| Error::unexpected(upload_url, "redirect without location"))?;
        debug!(location, "Confirming upload");
        api.send_json(api.authorize(HttpRequest::new(HttpMethod::Get, location)))?
    } else if response.is_success() {
        response.json().map_err(|e| Error::decode(upload_url, e))?
    } else {
        return Err(Error::Status {
            method: HttpMethod::Post.as_str().to_string(),
            url: upload_url.to_string(),
            status: response.status,
            body: excerpt(&response.text()),
        });
    };

    let file = files.resource(record)?;
    info!(name, file = %file.path, "Uploaded course file");
    Ok(Mutation::new(file, files.cache_key()))
}

/// The upload parameters from the announcement, in order, then the file.
fn upload_form<'a>(
    params: impl Iterator<Item = (&'a String, &'a Value)>,
    filename: &str,
    content: Vec<u8>,
) -> MultipartForm {
    params.fold(MultipartForm::new("file", filename, content), |form, (key, value)| {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        form.text(key.as_str(), value)
    })
}

/// Files of a course whose name equals `filename`.
pub fn files_named(
    api: &Api,
    cache: &CollectionCache,
    course: &ResourcePath,
    filename: &str,
) -> Result<Vec<RemoteResource>> {
    let files: Collection = course.collection(ResourceKind::File);
    Ok(cache
        .list(api, &files)?
        .iter()
        .filter(|f| f.str_field("filename") == Some(filename))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_parameters_precede_the_file() {
        let params = serde_json::Map::from_iter([
            ("key".to_string(), json!("abc/${filename}")),
            ("acl".to_string(), json!("private")),
            ("expires".to_string(), json!(3600)),
        ]);

        let form = upload_form(params.iter(), "deck \"v2\".html", b"<html/>".to_vec());

        assert_eq!(form.file_field, "file");
        assert_eq!(form.filename, "deck \"v2\".html");
        assert_eq!(form.content, b"<html/>");
        assert_eq!(form.fields.len(), 3);
        assert!(form.fields.contains(&("key".to_string(), "abc/${filename}".to_string())));
        assert!(form.fields.contains(&("expires".to_string(), "3600".to_string())));
    }
}
