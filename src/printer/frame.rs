//! ESC/POS framing for receipt jobs.

pub const ALIGN_CENTER: [u8; 3] = [0x1B, 0x61, 0x01];
pub const FONT_LARGE: [u8; 3] = [0x1D, 0x21, 0x11];
pub const FONT_NORMAL: [u8; 3] = [0x1B, 0x21, 0x00];
pub const TRAILING_FEEDS: usize = 4;

/// Wraps `payload` with the header block and trailing feeds.
pub fn build(header: &str, payload: &[u8]) -> Vec<u8> {
    let header = sanitize(header);
    let mut frame =
        Vec::with_capacity(ALIGN_CENTER.len() * 3 + header.len() + payload.len() + TRAILING_FEEDS + 1);

    frame.extend_from_slice(&ALIGN_CENTER);
    frame.extend_from_slice(&FONT_LARGE);
    frame.extend_from_slice(header.as_bytes());
    frame.push(b'\n');
    frame.extend_from_slice(&FONT_NORMAL);
    frame.extend_from_slice(payload);
    frame.extend(std::iter::repeat(b'\n').take(TRAILING_FEEDS));
    frame
}

/// Folds text into the printable ASCII range the printer's default code
/// page renders. Accents are dropped, unknown glyphs become `?`.
pub fn sanitize(text: &str) -> String {
    text.chars().filter_map(fold_char).collect()
}

fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        '\n' => '\n',
        '\r' => return None,
        '\t' => ' ',
        ' '..='~' => c,
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        '°' | 'º' => 'o',
        'ª' => 'a',
        '\u{a0}' => ' ',
        '¿' | '¡' => return None,
        _ => '?',
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let frame = build("MI NEGOCIO", b"Giros\n");

        assert_eq!(&frame[..3], &ALIGN_CENTER);
        assert_eq!(&frame[3..6], &FONT_LARGE);
        assert_eq!(&frame[6..17], b"MI NEGOCIO\n");
        assert_eq!(&frame[17..20], &FONT_NORMAL);
        assert_eq!(&frame[20..26], b"Giros\n");
        assert!(frame[26..].iter().all(|b| *b == b'\n'));
        assert_eq!(frame.len(), 26 + TRAILING_FEEDS);
    }

    #[test]
    fn sanitize_folds_accents() {
        assert_eq!(sanitize("Comisión Nº 5\r\n¿Señal?"), "Comision No 5\nSenal?");
        assert_eq!(sanitize("Pago ✓"), "Pago ?");
    }
}
