//! Builders for synthetic JPEG/Exif samples used by the unit tests.

use nom::number::Endianness;

use crate::exif::tags::ExifTag;

#[derive(Debug, Clone)]
pub enum Value {
    Short(u16),
    Long(u32),
    Rational(u32, u32),
    SRational(i32, i32),
    Rationals(Vec<(u32, u32)>),
    Ascii(&'static str),
    /// Arbitrary data format / components num / payload.
    Raw(u16, u32, Vec<u8>),
    /// A nested directory; the entry stores its offset as a LONG.
    Ifd(IfdBuilder),
}

#[derive(Debug, Clone)]
pub struct IfdBuilder {
    endian: Endianness,
    entries: Vec<(u16, Value)>,
}

impl IfdBuilder {
    pub fn new(endian: Endianness) -> Self {
        Self {
            endian,
            entries: Vec::new(),
        }
    }

    pub fn entry(self, tag: ExifTag, value: Value) -> Self {
        self.raw_entry(tag.code(), value)
    }

    pub fn raw_entry(mut self, code: u16, value: Value) -> Self {
        self.entries.push((code, value));
        self
    }

    /// TIFF data: byte order mark, magic, IFD0 offset (8), then IFD0.
    pub fn build_tiff(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(match self.endian {
            Endianness::Little => b"II",
            _ => b"MM",
        });
        out.extend_from_slice(&[0; 6]);
        put_u16(self.endian, &mut out, 2, 0x2a);
        put_u32(self.endian, &mut out, 4, 8);
        write_ifd(self.endian, &self.entries, &mut out);
        out
    }

    /// A complete JPEG file carrying this directory as its Exif segment.
    pub fn build_jpeg(&self) -> Vec<u8> {
        jpeg_with_exif(&self.build_tiff())
    }
}

fn put_u16(endian: Endianness, out: &mut [u8], pos: usize, v: u16) {
    let bs = match endian {
        Endianness::Little => v.to_le_bytes(),
        _ => v.to_be_bytes(),
    };
    out[pos..pos + 2].copy_from_slice(&bs);
}

fn put_u32(endian: Endianness, out: &mut [u8], pos: usize, v: u32) {
    let bs = match endian {
        Endianness::Little => v.to_le_bytes(),
        _ => v.to_be_bytes(),
    };
    out[pos..pos + 4].copy_from_slice(&bs);
}

fn encode_u32(endian: Endianness, v: u32) -> [u8; 4] {
    match endian {
        Endianness::Little => v.to_le_bytes(),
        _ => v.to_be_bytes(),
    }
}

fn encode(endian: Endianness, value: &Value) -> (u16, u32, Vec<u8>) {
    match value {
        Value::Short(v) => {
            let bs = match endian {
                Endianness::Little => v.to_le_bytes(),
                _ => v.to_be_bytes(),
            };
            (3, 1, bs.to_vec())
        }
        Value::Long(v) => (4, 1, encode_u32(endian, *v).to_vec()),
        Value::Rational(n, d) => {
            let mut bs = encode_u32(endian, *n).to_vec();
            bs.extend(encode_u32(endian, *d));
            (5, 1, bs)
        }
        Value::SRational(n, d) => {
            let mut bs = encode_u32(endian, *n as u32).to_vec();
            bs.extend(encode_u32(endian, *d as u32));
            (10, 1, bs)
        }
        Value::Rationals(vs) => {
            let bs = vs
                .iter()
                .flat_map(|(n, d)| {
                    let mut bs = encode_u32(endian, *n).to_vec();
                    bs.extend(encode_u32(endian, *d));
                    bs
                })
                .collect();
            (5, vs.len() as u32, bs)
        }
        Value::Ascii(s) => {
            let mut bs = s.as_bytes().to_vec();
            bs.push(0);
            (2, bs.len() as u32, bs)
        }
        Value::Raw(format, num, bs) => (*format, *num, bs.clone()),
        Value::Ifd(_) => unreachable!("sub-ifds are written by write_ifd"),
    }
}

/// Appends a directory (and its out-of-line data) to `out`, returning the
/// directory position.
fn write_ifd(endian: Endianness, entries: &[(u16, Value)], out: &mut Vec<u8>) -> u32 {
    let start = out.len();
    out.resize(start + 2 + entries.len() * 12 + 4, 0);
    put_u16(endian, out, start, entries.len() as u16);

    for (i, (tag, value)) in entries.iter().enumerate() {
        let entry = start + 2 + i * 12;
        put_u16(endian, out, entry, *tag);

        if let Value::Ifd(sub) = value {
            put_u16(endian, out, entry + 2, 4);
            put_u32(endian, out, entry + 4, 1);
            let pos = write_ifd(endian, &sub.entries, out);
            put_u32(endian, out, entry + 8, pos);
            continue;
        }

        let (format, num, bs) = encode(endian, value);
        put_u16(endian, out, entry + 2, format);
        put_u32(endian, out, entry + 4, num);
        if bs.len() <= 4 {
            out[entry + 8..entry + 8 + bs.len()].copy_from_slice(&bs);
        } else {
            if out.len() % 2 == 1 {
                out.push(0);
            }
            let pos = out.len() as u32;
            out.extend_from_slice(&bs);
            put_u32(endian, out, entry + 8, pos);
        }
    }

    start as u32
}

/// SOI, a JFIF APP0, the Exif APP1 wrapping `tiff`, a DQT, SOS with a few
/// bytes of scan data, EOI.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xff, 0xd8];
    out.extend_from_slice(&app0());

    out.extend_from_slice(&[0xff, 0xe1]);
    out.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);

    out.extend_from_slice(&image_tail());
    out
}

pub fn app0() -> Vec<u8> {
    let mut out = vec![0xff, 0xe0, 0x00, 0x10];
    out.extend_from_slice(b"JFIF\0");
    out.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    out
}

pub fn image_tail() -> Vec<u8> {
    let mut out = vec![0xff, 0xdb, 0x00, 0x04, 0x00, 0x01];
    out.extend_from_slice(&[0xff, 0xda, 0x00, 0x04, 0x01, 0x00]);
    out.extend_from_slice(&[0x12, 0x34, 0xff, 0x00, 0x56]);
    out.extend_from_slice(&[0xff, 0xd9]);
    out
}

/// Serves exactly one HTTP/1.1 response on a local port.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle resolving
/// to the head of the request that was received.
pub async fn serve_once(
    status: &'static str,
    body: Vec<u8>,
) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let mut resp = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        resp.extend_from_slice(&body);
        stream.write_all(&resp).await.unwrap();
        let _ = stream.shutdown().await;

        String::from_utf8_lossy(&head).into_owned()
    });

    (base, handle)
}
