//! Fragment envelope codec for tokio.
//!
//! This module provides a codec that carries DNP3 application fragments
//! between the outstation engine and an external link/transport adapter
//! using the tokio-util codec framework.
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+-----------------+
//! | Length (LE)     | Destination     | Source          | Fragment ...    |
//! +--------+--------+--------+--------+--------+--------+-----------------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Dnp3Error;

/// Length of the envelope header preceding each fragment.
pub const ENVELOPE_HEADER_LENGTH: usize = 6;

/// Destination addresses reserved for broadcast.
pub const BROADCAST_ADDRESSES: [u16; 3] = [0xFFFD, 0xFFFE, 0xFFFF];

/// Link addresses of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Addresses {
    /// Address of the receiving station
    pub destination: u16,
    /// Address of the sending station
    pub source: u16,
}

impl Addresses {
    /// Create a new address pair.
    pub const fn new(destination: u16, source: u16) -> Self {
        Self {
            destination,
            source,
        }
    }

    /// Check if the destination is one of the broadcast addresses.
    pub fn is_broadcast(&self) -> bool {
        BROADCAST_ADDRESSES.contains(&self.destination)
    }

    /// Address pair for a reply to this fragment.
    pub const fn reply(&self) -> Self {
        Self::new(self.source, self.destination)
    }
}

/// An addressed application fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub addresses: Addresses,
    pub data: Bytes,
}

impl Fragment {
    /// Create a new fragment.
    pub fn new(addresses: Addresses, data: impl Into<Bytes>) -> Self {
        Self {
            addresses,
            data: data.into(),
        }
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({} bytes)",
            self.addresses.source,
            self.addresses.destination,
            self.data.len()
        )
    }
}

/// Fragment envelope codec.
///
/// # Example
///
/// ```rust,ignore
/// use tokio_util::codec::Framed;
/// use voltage_dnp3::codec::FragmentCodec;
///
/// let stream = TcpStream::connect("127.0.0.1:20000").await?;
/// let mut framed = Framed::new(stream, FragmentCodec::new(2048));
///
/// while let Some(fragment) = framed.next().await {
///     println!("Received: {}", fragment?);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FragmentCodec {
    max_fragment_size: usize,
    state: DecodeState,
}

#[derive(Debug, Clone, Default)]
enum DecodeState {
    #[default]
    WaitingForHeader,
    WaitingForData {
        length: usize,
        addresses: Addresses,
    },
}

impl FragmentCodec {
    /// Create a new codec accepting fragments up to `max_fragment_size` bytes.
    pub fn new(max_fragment_size: usize) -> Self {
        Self {
            max_fragment_size,
            state: DecodeState::default(),
        }
    }

    /// Maximum accepted fragment size.
    pub fn max_fragment_size(&self) -> usize {
        self.max_fragment_size
    }
}

impl Decoder for FragmentCodec {
    type Item = Fragment;
    type Error = Dnp3Error;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::WaitingForHeader => {
                    if src.len() < ENVELOPE_HEADER_LENGTH {
                        return Ok(None);
                    }

                    let length = src.get_u16_le() as usize;
                    let destination = src.get_u16_le();
                    let source = src.get_u16_le();

                    if length == 0 {
                        return Err(Dnp3Error::Codec("Empty fragment".into()));
                    }
                    if length > self.max_fragment_size {
                        return Err(Dnp3Error::Codec(
                            format!(
                                "Fragment length {} exceeds maximum {}",
                                length, self.max_fragment_size
                            )
                            .into(),
                        ));
                    }

                    src.reserve(length);
                    self.state = DecodeState::WaitingForData {
                        length,
                        addresses: Addresses::new(destination, source),
                    };
                }

                DecodeState::WaitingForData { length, addresses } => {
                    if src.len() < length {
                        return Ok(None);
                    }

                    let data = src.split_to(length).freeze();
                    self.state = DecodeState::WaitingForHeader;
                    return Ok(Some(Fragment { addresses, data }));
                }
            }
        }
    }
}

impl Encoder<Fragment> for FragmentCodec {
    type Error = Dnp3Error;

    fn encode(
        &mut self,
        item: Fragment,
        dst: &mut BytesMut,
    ) -> std::result::Result<(), Self::Error> {
        if item.data.len() > self.max_fragment_size {
            return Err(Dnp3Error::Codec("Fragment too large".into()));
        }

        dst.reserve(ENVELOPE_HEADER_LENGTH + item.data.len());
        dst.put_u16_le(item.data.len() as u16);
        dst.put_u16_le(item.addresses.destination);
        dst.put_u16_le(item.addresses.source);
        dst.extend_from_slice(&item.data);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fragment() {
        let mut codec = FragmentCodec::new(2048);
        let mut buf = BytesMut::from(&[0x02, 0x00, 0x0A, 0x00, 0x01, 0x00, 0xC0, 0x01][..]);

        let fragment = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(fragment.addresses, Addresses::new(10, 1));
        assert_eq!(&fragment.data[..], &[0xC0, 0x01]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_fragment() {
        let mut codec = FragmentCodec::new(2048);

        let mut buf = BytesMut::from(&[0x03, 0x00, 0x0A][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0xC0]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0x01, 0x00]);
        let fragment = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&fragment.data[..], &[0xC0, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_two_fragments() {
        let mut codec = FragmentCodec::new(2048);
        let mut buf = BytesMut::from(
            &[
                0x02, 0x00, 0x0A, 0x00, 0x01, 0x00, 0xC0, 0x01, 0x02, 0x00, 0xFF, 0xFF, 0x01, 0x00,
                0xC1, 0x0D,
            ][..],
        );

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert!(!first.addresses.is_broadcast());
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert!(second.addresses.is_broadcast());
        assert_eq!(&second.data[..], &[0xC1, 0x0D]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let mut codec = FragmentCodec::new(249);
        let mut buf = BytesMut::from(&[0xFA, 0x00, 0x0A, 0x00, 0x01, 0x00][..]);
        assert!(matches!(codec.decode(&mut buf), Err(Dnp3Error::Codec(_))));
    }

    #[test]
    fn test_decode_rejects_empty() {
        let mut codec = FragmentCodec::new(2048);
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x0A, 0x00, 0x01, 0x00][..]);
        assert!(matches!(codec.decode(&mut buf), Err(Dnp3Error::Codec(_))));
    }

    #[test]
    fn test_encode_fragment() {
        let mut codec = FragmentCodec::new(2048);
        let mut buf = BytesMut::new();

        let fragment = Fragment::new(Addresses::new(1, 10), vec![0xC0, 0x81, 0x80, 0x00]);
        codec.encode(fragment, &mut buf).unwrap();

        assert_eq!(
            &buf[..],
            &[0x04, 0x00, 0x01, 0x00, 0x0A, 0x00, 0xC0, 0x81, 0x80, 0x00]
        );
    }

    #[test]
    fn test_encode_rejects_oversized() {
        let mut codec = FragmentCodec::new(4);
        let mut buf = BytesMut::new();
        let fragment = Fragment::new(Addresses::new(1, 10), vec![0u8; 5]);
        assert!(codec.encode(fragment, &mut buf).is_err());
    }

    #[test]
    fn test_reply_addresses() {
        let addresses = Addresses::new(10, 1);
        assert_eq!(addresses.reply(), Addresses::new(1, 10));
        assert!(Addresses::new(0xFFFD, 1).is_broadcast());
        assert!(Addresses::new(0xFFFE, 1).is_broadcast());
    }
}
