//! Rowkey byte helpers.

/// Largest byte value the store's scan boundary treats as incrementable.
///
/// The store API compares boundary bytes as signed, so `0x7F` cannot carry;
/// a byte at the boundary is dropped and the carry moves left.
const CARRY_MAX: u8 = 0x7F;

/// Smallest byte sequence greater than every sequence starting with
/// `prefix`, used as the exclusive stop key that closes a prefix or an
/// inclusive upper bound.
///
/// Returns `None` when every byte sits at the carry boundary; the range
/// is open-ended on the right.
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    loop {
        match out.last().copied() {
            None => return None,
            Some(b) if b < CARRY_MAX => {
                let end = out.len() - 1;
                out[end] = b + 1;
                return Some(out);
            }
            Some(_) => {
                out.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_last_byte() {
        assert_eq!(prefix_successor(b"hello").unwrap(), b"hellp");
        assert_eq!(prefix_successor(b"BLUE").unwrap(), b"BLUF");
    }

    #[test]
    fn carries_past_boundary_bytes() {
        assert_eq!(prefix_successor(&[0x61, 0x7F]).unwrap(), vec![0x62]);
        assert_eq!(prefix_successor(&[0x61, 0x7F, 0x7F]).unwrap(), vec![0x62]);
    }

    #[test]
    fn all_boundary_bytes_have_no_successor() {
        assert_eq!(prefix_successor(&[0x7F, 0x7F, 0x7F]), None);
        assert_eq!(prefix_successor(&[]), None);
    }

    #[test]
    fn successor_is_exclusive_upper_bound_for_prefix() {
        let succ = prefix_successor(b"row-1").unwrap();
        assert!(b"row-1".as_slice() < succ.as_slice());
        assert!(b"row-19999".as_slice() < succ.as_slice());
        assert!(b"row-2".as_slice() >= succ.as_slice());
    }
}
