//! Minimal `multipart/form-data` encoding for a single file field

use uuid::Uuid;

use crate::data::DataFile;

/// An encoded form: its `Content-Type` header value and body
pub struct FileForm {
    pub content_type: String,
    pub body: Vec<u8>,
}

pub fn file_form(field: &str, file: &DataFile) -> FileForm {
    let boundary = format!("plot-composer-{}", Uuid::new_v4().simple());
    let filename = file.name().replace('"', "%22");

    let mut body = Vec::with_capacity(file.bytes().len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("Content-Type: {}\r\n\r\n", mime_type(&file.extension())).as_bytes(),
    );
    body.extend_from_slice(file.bytes());
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    FileForm {
        content_type: format!("multipart/form-data; boundary={}", boundary),
        body,
    }
}

fn mime_type(extension: &str) -> &'static str {
    match extension {
        "csv" => "text/csv",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_form_layout() {
        let file = DataFile::new("sales.csv", "a,b\n1,2\n");
        let form = file_form("file", &file);

        let boundary = form
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let body = String::from_utf8(form.body).unwrap();

        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.contains("name=\"file\"; filename=\"sales.csv\""));
        assert!(body.contains("Content-Type: text/csv\r\n\r\na,b\n1,2\n\r\n"));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    }
}
