use bytes::Bytes;

/// Request target in one of the four RFC 7230 forms.
#[derive(Debug)]
pub struct Target {
    value: Bytes,
    kind: TargetKind,
}

/// The syntactic form of a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `/path?query`
    Origin,
    /// `*`
    Asterisk,
    /// `scheme://host[:port]/path`
    Absolute,
    /// `host:port`
    Authority,
}

impl Target {
    pub(crate) fn new(value: Bytes) -> Self {
        // whether an authority-form target fits the method is validated once
        // the full request head is known
        let kind = match value.as_ref() {
            [b'/', ..] => TargetKind::Origin,
            b"*" => TargetKind::Asterisk,
            _ if value.windows(3).any(|w| w == b"://") => TargetKind::Absolute,
            _ => TargetKind::Authority,
        };

        Target { value, kind }
    }

    /// Returns the target form.
    #[inline]
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns the raw target bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    pub(crate) fn into_bytes(self) -> Bytes {
        self.value
    }
}
