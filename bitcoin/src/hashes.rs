//! Marked digests used by Bitcoin transactions: a txid and a wtxid are both 32-byte
//! double-SHA-256 outputs, but are never interchangeable.

use txcore::mark_hash256;

mark_hash256!(TXID);
mark_hash256!(WTXID);
