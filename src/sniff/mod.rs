//! Guessing file extensions of extracted resources from their first bytes.

pub type Signature = (&'static str, &'static [u8]);

/// `(extension, magic)` pairs. Order matters: the first match wins.
pub const SIGNATURES: &[Signature] = &[
    (".png", b"\x89PNG\r\n\x1a\n"),
    (".html", b"<!doctype html>"),
    (".html", b"<!DOCTYPE html>"),
    (".html", b"<html>"),
    (".html", b"<!--"),
    (".html", b"<link"),
    (".svg", b"<svg "),
    (".js", b"// "),
    (".js", b"(function"),
    (".css", b"/*"),
    (".json", b"{"),
    (".gz", b"\x1f\x8b"),
];

/// Extension (with the leading dot) of the first signature matching `blob`,
/// or an empty string.
pub fn sniff_extension(blob: &[u8]) -> &'static str {
    sniff_with(SIGNATURES, blob)
}

/// The blob has to be strictly longer than the magic, so a blob consisting of
/// nothing but the magic does not match. Existing unpacked trees rely on this.
pub fn sniff_with(table: &[Signature], blob: &[u8]) -> &'static str {
    table
        .iter()
        .find(|(_, magic)| blob.len() > magic.len() && blob.starts_with(magic))
        .map_or("", |(ext, _)| *ext)
}
