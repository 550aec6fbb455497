use bytes::Bytes;
use expensa_core::{IdentityClaim, TokenCodec};

pub const BOUNDARY: &str = "----expensa-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Token for `u-42` issued `age_ms` ago.
pub fn token_aged(age_ms: u64) -> String {
    let now = expensa_core::token::now_epoch_ms();
    TokenCodec::new()
        .encode(&IdentityClaim::new("u-42", "alice", now - age_ms))
        .expect("encode token")
}

/// Fresh token asserting an arbitrary user id.
pub fn token_for(subject_id: &str) -> String {
    TokenCodec::new()
        .issue(subject_id, "mallory")
        .expect("encode token")
}

pub fn fresh_token() -> String {
    token_aged(0)
}

/// Minimal multipart body builder.
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Bytes {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Bytes::from(self.buf)
    }
}

/// 1000 bytes starting with the PNG signature.
pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(1000, 0xAB);
    data
}
