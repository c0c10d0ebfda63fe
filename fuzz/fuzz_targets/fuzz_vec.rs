#![no_main]

use libfuzzer_sys::fuzz_target;

use packvec::{storage::Storage, type_set, InlinePackVec, PackVec, PackVecInner};

type_set! {
    #[derive(Clone, PartialEq)]
    enum Chunk {
        Byte(u8),
        Word(u32),
        Bytes(Vec<u8>),
    }

    #[derive(Debug, PartialEq)]
    enum ChunkRef<'a>;

    enum ChunkMut<'a>;
}

/// Splits `data` into chunks, the first byte of each picking the member.
fn chunks(data: &[u8]) -> std::vec::Vec<Chunk> {
    let mut chunks = std::vec::Vec::new();
    let mut rest = data;
    while let Some((&kind, tail)) = rest.split_first() {
        let (chunk, tail) = match kind % 3 {
            0 => (tail.first().map(|&byte| Chunk::Byte(byte)), tail.get(1..)),
            1 => (
                tail.get(..4)
                    .map(|word| Chunk::Word(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))),
                tail.get(4..),
            ),
            _ => {
                let len = usize::from(kind / 3).min(tail.len());
                (Some(Chunk::Bytes(tail[..len].to_vec())), Some(&tail[len..]))
            }
        };
        chunks.extend(chunk);
        rest = tail.unwrap_or_default();
    }
    chunks
}

fn check<B: Storage<Chunk>>(mut vec: PackVecInner<Chunk, B>, chunks: &[Chunk]) {
    let mut pushed = 0;
    for chunk in chunks {
        if vec.push(chunk.clone()).is_err() {
            break;
        }
        pushed += 1;
    }

    assert_eq!(vec.len(), pushed);
    for (index, chunk) in chunks[..pushed].iter().enumerate() {
        let expected = match chunk {
            Chunk::Byte(byte) => ChunkRef::Byte(*byte),
            Chunk::Word(word) => ChunkRef::Word(*word),
            Chunk::Bytes(bytes) => ChunkRef::Bytes(bytes.clone()),
        };
        assert_eq!(vec.read(index), expected);
    }

    let copy = vec.clone();
    assert!(copy == vec);
    while let Some(last) = vec.pop() {
        pushed -= 1;
        assert!(last == chunks[pushed]);
    }
}

fuzz_target!(|data: &[u8]| {
    let chunks = chunks(data);
    check(InlinePackVec::<Chunk, 64, 16, u8>::new(), &chunks);
    check(InlinePackVec::<Chunk, 1024, 128>::new(), &chunks);
    check(PackVec::<Chunk>::new(), &chunks);
});
