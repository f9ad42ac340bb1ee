//! ABI token decoding for the contract's `PollStruct` and `ContestantStruct`

use super::{ChainError, Result};
use crate::models::{NumericLike, RawContestant, RawPoll};
use ethers::abi::Token;
use ethers::types::Address;
use ethers::utils::to_checksum;

const POLL_FIELDS: usize = 13;
const CONTESTANT_FIELDS: usize = 6;

/// Fields of one ABI tuple, consumed in declaration order
struct Fields {
    strukt: &'static str,
    inner: std::vec::IntoIter<Token>,
}

impl Fields {
    fn new(token: Token, strukt: &'static str, expected: usize) -> Result<Self> {
        match token {
            Token::Tuple(fields) if fields.len() == expected => Ok(Self {
                strukt,
                inner: fields.into_iter(),
            }),
            Token::Tuple(fields) => Err(ChainError::Decode(format!(
                "{} has {} fields, expected {}",
                strukt,
                fields.len(),
                expected
            ))),
            other => Err(ChainError::Decode(format!(
                "{} is not a tuple: {:?}",
                strukt, other
            ))),
        }
    }

    fn next(&mut self, field: &str) -> Result<Token> {
        self.inner
            .next()
            .ok_or_else(|| ChainError::Decode(format!("{}.{} is missing", self.strukt, field)))
    }

    fn mismatch(&self, field: &str, expected: &str, got: &Token) -> ChainError {
        ChainError::Decode(format!(
            "{}.{} expected {}, got {:?}",
            self.strukt, field, expected, got
        ))
    }

    fn uint(&mut self, field: &str) -> Result<NumericLike> {
        match self.next(field)? {
            Token::Uint(v) => Ok(NumericLike::Big(v)),
            other => Err(self.mismatch(field, "uint256", &other)),
        }
    }

    fn string(&mut self, field: &str) -> Result<String> {
        match self.next(field)? {
            Token::String(s) => Ok(s),
            other => Err(self.mismatch(field, "string", &other)),
        }
    }

    fn boolean(&mut self, field: &str) -> Result<bool> {
        match self.next(field)? {
            Token::Bool(b) => Ok(b),
            other => Err(self.mismatch(field, "bool", &other)),
        }
    }

    fn address(&mut self, field: &str) -> Result<String> {
        match self.next(field)? {
            Token::Address(a) => Ok(checksummed(&a)),
            other => Err(self.mismatch(field, "address", &other)),
        }
    }

    fn addresses(&mut self, field: &str) -> Result<Vec<String>> {
        match self.next(field)? {
            Token::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Token::Address(a) => Ok(checksummed(&a)),
                    other => Err(self.mismatch(field, "address[]", &other)),
                })
                .collect(),
            other => Err(self.mismatch(field, "address[]", &other)),
        }
    }

    fn strings(&mut self, field: &str) -> Result<Vec<String>> {
        match self.next(field)? {
            Token::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Token::String(s) => Ok(s),
                    other => Err(self.mismatch(field, "string[]", &other)),
                })
                .collect(),
            other => Err(self.mismatch(field, "string[]", &other)),
        }
    }
}

/// EIP-55 form, the way wallets and explorers print addresses
pub fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}

pub fn poll_from_token(token: Token) -> Result<RawPoll> {
    let mut f = Fields::new(token, "PollStruct", POLL_FIELDS)?;
    Ok(RawPoll {
        id: f.uint("id")?,
        image: f.string("image")?,
        title: f.string("title")?,
        description: f.string("description")?,
        votes: f.uint("votes")?,
        contestants: f.uint("contestants")?,
        deleted: f.boolean("deleted")?,
        director: f.address("director")?,
        starts_at: f.uint("startsAt")?,
        ends_at: f.uint("endsAt")?,
        timestamp: f.uint("timestamp")?,
        voters: f.addresses("voters")?,
        avatars: f.strings("avatars")?,
    })
}

pub fn contestant_from_token(token: Token) -> Result<RawContestant> {
    let mut f = Fields::new(token, "ContestantStruct", CONTESTANT_FIELDS)?;
    Ok(RawContestant {
        id: f.uint("id")?,
        image: f.string("image")?,
        name: f.string("name")?,
        voter: f.address("voter")?,
        votes: f.uint("votes")?,
        voters: f.addresses("voters")?,
    })
}

pub fn polls_from_token(token: Token) -> Result<Vec<RawPoll>> {
    array(token, "PollStruct[]")?
        .into_iter()
        .map(poll_from_token)
        .collect()
}

pub fn contestants_from_token(token: Token) -> Result<Vec<RawContestant>> {
    array(token, "ContestantStruct[]")?
        .into_iter()
        .map(contestant_from_token)
        .collect()
}

fn array(token: Token, what: &str) -> Result<Vec<Token>> {
    match token {
        Token::Array(items) => Ok(items),
        other => Err(ChainError::Decode(format!(
            "{} is not an array: {:?}",
            what, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    fn contestant_token(id: u64, votes: u64, voter: Address) -> Token {
        Token::Tuple(vec![
            Token::Uint(U256::from(id)),
            Token::String("https://gw.example/ipfs/QmFace".to_string()),
            Token::String("Alice".to_string()),
            Token::Address(voter),
            Token::Uint(U256::from(votes)),
            Token::Array(vec![Token::Address(voter)]),
        ])
    }

    #[test]
    fn test_contestants_decode_with_checksummed_addresses() {
        let voter: Address = "0x5fbdb2315678afecb367f032d93f642f64180aa3".parse().unwrap();
        let decoded = contestants_from_token(Token::Array(vec![
            contestant_token(1, 3, voter),
            contestant_token(2, 10, voter),
        ]))
        .unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].votes, NumericLike::Big(U256::from(10)));
        assert_eq!(decoded[0].voter, "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert_eq!(decoded[0].voters, vec![decoded[0].voter.clone()]);
    }

    #[test]
    fn test_wrong_arity_is_a_decode_error() {
        let err = contestant_from_token(Token::Tuple(vec![Token::Bool(true)])).unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)));
    }

    #[test]
    fn test_wrong_field_type_names_the_field() {
        let voter = Address::zero();
        let mut fields = match contestant_token(1, 1, voter) {
            Token::Tuple(fields) => fields,
            _ => unreachable!(),
        };
        fields[2] = Token::Bool(false);

        let err = contestant_from_token(Token::Tuple(fields)).unwrap_err();
        assert!(err.to_string().contains("ContestantStruct.name"));
    }
}
