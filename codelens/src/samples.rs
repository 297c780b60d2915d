//! Sample snippets cycled into the editor with `S`.

use codelens_core::language::Language;

pub struct Sample {
    pub language: Language,
    pub code: &'static str,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        language: Language::JavaScript,
        code: r#"function fibonacci(n) {
  if (n <= 1) return n;
  return fibonacci(n - 1) + fibonacci(n - 2);
}

// Calculate the 10th Fibonacci number
const result = fibonacci(10);
console.log(result);"#,
    },
    Sample {
        language: Language::Python,
        code: r#"def merge_sort(arr):
    if len(arr) <= 1:
        return arr

    mid = len(arr) // 2
    left = merge_sort(arr[:mid])
    right = merge_sort(arr[mid:])

    return merge(left, right)

def merge(left, right):
    result = []
    i = j = 0

    while i < len(left) and j < len(right):
        if left[i] < right[j]:
            result.append(left[i])
            i += 1
        else:
            result.append(right[j])
            j += 1

    result.extend(left[i:])
    result.extend(right[j:])
    return result

# Test the merge sort
test_array = [38, 27, 43, 3, 9, 82, 10]
sorted_array = merge_sort(test_array)
print(sorted_array)"#,
    },
    Sample {
        language: Language::TypeScript,
        code: r#"type UserId = number;

interface User {
  id: UserId;
  name: string;
  email: string;
  isActive: boolean;
}

class UserService {
  private users: User[] = [];

  getAllUsers(): User[] {
    return this.users;
  }

  getUserById(id: UserId): User | undefined {
    return this.users.find(user => user.id === id);
  }

  addUser(user: Omit<User, "id">): User {
    const newUser = { ...user, id: this.users.length + 1 };
    this.users.push(newUser);
    return newUser;
  }
}

const userService = new UserService();
userService.addUser({ name: "Jane Smith", email: "jane@example.com", isActive: true });
console.log(userService.getAllUsers());"#,
    },
];

/// Index of the sample after `current` (the first when nothing was shown yet).
pub fn next_index(current: Option<usize>) -> usize {
    current.map_or(0, |i| (i + 1) % SAMPLES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codelens_core::language::detect;
    use codelens_core::validate::{validate, ValidationLimits};

    #[test]
    fn samples_are_detected_as_their_language() {
        for sample in SAMPLES {
            assert_eq!(detect(sample.code), Some(sample.language), "{}", sample.language);
        }
    }

    #[test]
    fn samples_pass_validation() {
        for sample in SAMPLES {
            assert!(validate(sample.code, &ValidationLimits::default()).is_ok());
        }
    }

    #[test]
    fn cycling_wraps() {
        assert_eq!(next_index(None), 0);
        assert_eq!(next_index(Some(SAMPLES.len() - 1)), 0);
    }
}
