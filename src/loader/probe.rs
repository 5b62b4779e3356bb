use serde::Serialize;
use std::fmt;

const TS_PACKET: usize = 188;

/// 根据文件头识别出的容器格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mov,
    WebM,
    Matroska,
    Ogg,
    Avi,
    MpegTs,
    MpegPs,
    Flv,
    Unknown,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::WebM => "webm",
            Container::Matroska => "matroska",
            Container::Ogg => "ogg",
            Container::Avi => "avi",
            Container::MpegTs => "mpeg-ts",
            Container::MpegPs => "mpeg-ps",
            Container::Flv => "flv",
            Container::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// 先看 magic bytes，认不出再退回到扩展名。
pub fn probe_container(head: &[u8], source: &str) -> Container {
    match sniff(head) {
        Container::Unknown => from_extension(source),
        c => c,
    }
}

fn sniff(head: &[u8]) -> Container {
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return if &head[8..12] == b"qt  " {
            Container::Mov
        } else {
            Container::Mp4
        };
    }
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML 头里的 DocType 决定是 webm 还是 mkv
        let window = &head[..head.len().min(64)];
        return if window.windows(4).any(|w| w == b"webm") {
            Container::WebM
        } else {
            Container::Matroska
        };
    }
    if head.starts_with(b"OggS") {
        return Container::Ogg;
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"AVI " {
        return Container::Avi;
    }
    if head.starts_with(b"FLV") {
        return Container::Flv;
    }
    if head.starts_with(&[0x00, 0x00, 0x01, 0xBA]) {
        return Container::MpegPs;
    }
    if head.len() > TS_PACKET && head[0] == 0x47 && head[TS_PACKET] == 0x47 {
        return Container::MpegTs;
    }
    Container::Unknown
}

fn from_extension(source: &str) -> Container {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let Some((_, ext)) = path.rsplit_once('.') else {
        return Container::Unknown;
    };
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => Container::Mp4,
        "mov" => Container::Mov,
        "webm" => Container::WebM,
        "mkv" => Container::Matroska,
        "ogv" | "ogg" => Container::Ogg,
        "avi" => Container::Avi,
        "ts" | "m2ts" => Container::MpegTs,
        "mpg" | "mpeg" => Container::MpegPs,
        "flv" => Container::Flv,
        _ => Container::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mp4_and_mov() {
        let mut mp4 = vec![0, 0, 0, 0x20];
        mp4.extend_from_slice(b"ftypisom");
        assert_eq!(probe_container(&mp4, "x"), Container::Mp4);

        let mut mov = vec![0, 0, 0, 0x14];
        mov.extend_from_slice(b"ftypqt  ");
        assert_eq!(probe_container(&mov, "x"), Container::Mov);
    }

    #[test]
    fn detects_webm_vs_matroska() {
        let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x82, 0x84];
        webm.extend_from_slice(b"webm");
        assert_eq!(probe_container(&webm, "x"), Container::WebM);

        let mut mkv = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x82, 0x88];
        mkv.extend_from_slice(b"matroska");
        assert_eq!(probe_container(&mkv, "x"), Container::Matroska);
    }

    #[test]
    fn detects_transport_stream() {
        let mut ts = vec![0u8; TS_PACKET * 2];
        ts[0] = 0x47;
        ts[TS_PACKET] = 0x47;
        assert_eq!(probe_container(&ts, "x"), Container::MpegTs);
    }

    #[test]
    fn falls_back_to_extension() {
        assert_eq!(
            probe_container(b"????", "https://cdn.example.com/a/clip.WEBM?sig=1"),
            Container::WebM
        );
        assert_eq!(probe_container(b"", "/videos/intro.m4v"), Container::Mp4);
        assert_eq!(probe_container(b"", "no-extension"), Container::Unknown);
    }
}
