// Archivo: content_type.rs
// Propósito: deducir el content type de un documento a partir de sus
// primeros bytes cuando el cliente no lo declara.

const OCTET_STREAM: &str = "application/octet-stream";

/// Firmas conocidas (prefijo de bytes -> content type).
const SIGNATURES: &[(&[u8], &str)] = &[(b"%PDF-" as &[u8], "application/pdf"),
                                       (b"\x89PNG\r\n\x1a\n" as &[u8], "image/png"),
                                       (b"\xFF\xD8\xFF" as &[u8], "image/jpeg"),
                                       (b"GIF87a" as &[u8], "image/gif"),
                                       (b"GIF89a" as &[u8], "image/gif"),
                                       (b"PK\x03\x04" as &[u8], "application/zip")];

/// Devuelve el content type detectado. Texto UTF-8 sin bytes de control se
/// clasifica como `text/plain; charset=utf-8`; cualquier otra cosa como
/// `application/octet-stream`.
pub fn detect_content_type(bytes: &[u8]) -> &'static str {
    if let Some((_, ct)) = SIGNATURES.iter().find(|(sig, _)| bytes.starts_with(sig)) {
        return *ct;
    }
    if bytes.is_empty() {
        return "text/plain; charset=utf-8";
    }
    let head = &bytes[..bytes.len().min(512)];
    let printable = head.iter()
                        .all(|b| !b.is_ascii_control() || matches!(*b, b'\n' | b'\r' | b'\t' | 0x0C));
    // un corte a mitad de un carácter multibyte no invalida el texto
    let utf8 = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    if printable && utf8 {
        "text/plain; charset=utf-8"
    } else {
        OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_signatures() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n..."), "application/pdf");
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n\0\0"), "image/png");
        assert_eq!(detect_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(detect_content_type(b"PK\x03\x04rest"), "application/zip");
    }

    #[test]
    fn text_and_binary_fallbacks() {
        assert_eq!(detect_content_type("паспорт серия 4500".as_bytes()), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(&[0x00, 0x01, 0x02]), OCTET_STREAM);
    }
}
