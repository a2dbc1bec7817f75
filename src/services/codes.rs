use rand::Rng;

// Lowercase, without the ambiguous 0/o/1/l/i pairs.
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

pub(crate) const STUDENT_CODE_LEN: usize = 12;
const SESSION_TOKEN_LEN: usize = 22;

/// The 12-character opaque code that is a student's only credential.
pub(crate) fn generate_student_code() -> String {
    generate(STUDENT_CODE_LEN)
}

/// Opaque token identifying one test-launch session.
pub(crate) fn generate_session_token() -> String {
    generate(SESSION_TOKEN_LEN)
}

fn generate(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(len);
    for _ in 0..len {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}
